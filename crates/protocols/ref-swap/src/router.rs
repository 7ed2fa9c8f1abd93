//! Route Estimator
//!
//! Builds a token graph from the pool snapshot and picks the path with the
//! best output. Smart mode prices stable pools with the invariant, walks up to
//! `max_hops` and may split the input across pool-disjoint paths; simple mode
//! only considers direct constant-product pools.
//!
//! A route is a flat list of steps. Parallel paths are concatenated: a path
//! starts wherever a step doesn't continue from the previous step's output,
//! and the first steps' `amount_in` values sum to the swapped amount.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::calculator::{calculate_output, calculate_stable_output};
use crate::constants::routing::{
    DEFAULT_MAX_POOLS_PER_PAIR, MAX_SPLIT_PATHS, MIN_SPLIT_GAIN_BPS, SPLIT_STEP_PERMILLE,
};
use crate::state::{MarketState, PoolKind, RouteError, RouteOrigin, StablePoolDetail, SwapError, SwapStep};

/// How an edge prices a trade
#[derive(Debug, Clone)]
pub enum EdgeCurve {
    ConstantProduct {
        reserves_in: u128,
        reserves_out: u128,
        total_fee: u32,
    },
    Stable(Arc<StablePoolDetail>),
}

/// An edge in the pool graph connecting two tokens via a specific pool.
#[derive(Debug, Clone)]
pub struct PoolEdge {
    pub pool_id: u64,
    pub pool_kind: PoolKind,
    pub token_in: String,
    pub token_out: String,
    pub curve: EdgeCurve,
}

impl PoolEdge {
    /// Output for `amount_in`; zero when the pool can't fill it
    pub fn quote(&self, amount_in: u128) -> u128 {
        match &self.curve {
            EdgeCurve::ConstantProduct {
                reserves_in,
                reserves_out,
                total_fee,
            } => calculate_output(*reserves_in, *reserves_out, amount_in, *total_fee),
            EdgeCurve::Stable(detail) => {
                calculate_stable_output(detail, &self.token_in, &self.token_out, amount_in).unwrap_or(0)
            }
        }
    }

    fn is_stable(&self) -> bool {
        matches!(self.curve, EdgeCurve::Stable(_))
    }

    fn reserves_in(&self) -> u128 {
        match &self.curve {
            EdgeCurve::ConstantProduct { reserves_in, .. } => *reserves_in,
            EdgeCurve::Stable(_) => u128::MAX,
        }
    }
}

/// Adjacency-list pool graph. Edges out of each token keep scan order:
/// stable pools first, then simple pools.
#[derive(Debug, Clone, Default)]
pub struct PoolGraph {
    pub adjacency: HashMap<String, Vec<PoolEdge>>,
    pub pool_count: usize,
}

impl PoolGraph {
    fn add_edge(&mut self, edge: PoolEdge) {
        self.adjacency.entry(edge.token_in.clone()).or_default().push(edge);
    }
}

/// Build a pool graph from the market.
///
/// With `include_stable`, every stable pool contributes an edge per ordered
/// token pair and must have a detail; a missing detail is an error so the
/// caller can fall back. Simple pools with an empty side are skipped. Per
/// directed pair only the `max_pools_per_pair` deepest simple pools are kept.
pub fn build_pool_graph(
    market: &MarketState,
    include_stable: bool,
    max_pools_per_pair: usize,
) -> Result<PoolGraph, RouteError> {
    let mut graph = PoolGraph::default();

    if include_stable {
        for pool in market.pools.stable_pools() {
            let detail = market
                .stable_detail(pool.id)
                .cloned()
                .map(Arc::new)
                .ok_or(RouteError::MissingStableDetail { pool_id: pool.id })?;

            for (i, token_in) in detail.token_account_ids.iter().enumerate() {
                for (j, token_out) in detail.token_account_ids.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    graph.add_edge(PoolEdge {
                        pool_id: pool.id,
                        pool_kind: pool.kind,
                        token_in: token_in.clone(),
                        token_out: token_out.clone(),
                        curve: EdgeCurve::Stable(detail.clone()),
                    });
                }
            }
            graph.pool_count += 1;
        }
    }

    for pool in &market.pools.simple_pools {
        let (token_x, token_y) = match pool.token_account_ids.as_slice() {
            [x, y] => (x, y),
            _ => continue,
        };
        let (reserve_x, reserve_y) = match pool.amounts.as_slice() {
            [rx, ry] if *rx > 0 && *ry > 0 => (*rx, *ry),
            _ => continue,
        };

        for (token_in, token_out, reserves_in, reserves_out) in [
            (token_x, token_y, reserve_x, reserve_y),
            (token_y, token_x, reserve_y, reserve_x),
        ] {
            graph.add_edge(PoolEdge {
                pool_id: pool.id,
                pool_kind: pool.kind,
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                curve: EdgeCurve::ConstantProduct {
                    reserves_in,
                    reserves_out,
                    total_fee: pool.total_fee,
                },
            });
        }
        graph.pool_count += 1;
    }

    // Prune: keep the top N simple pools per (token_in, token_out) by reserves
    for edges in graph.adjacency.values_mut() {
        let mut by_target: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            if !edge.is_stable() {
                by_target.entry(&edge.token_out).or_default().push(i);
            }
        }

        let mut pruned: HashSet<usize> = HashSet::new();
        for indices in by_target.values() {
            let mut sorted = indices.clone();
            sorted.sort_by(|&a, &b| edges[b].reserves_in().cmp(&edges[a].reserves_in()));
            pruned.extend(sorted.into_iter().skip(max_pools_per_pair));
        }

        let mut i = 0;
        edges.retain(|_| {
            let retained = !pruned.contains(&i);
            i += 1;
            retained
        });
    }

    Ok(graph)
}

/// Find all acyclic paths from `source_token` to `target_token`, up to `max_hops`.
///
/// BFS, so paths come out in nondecreasing hop count. No token is revisited
/// and no pool is used twice in one path.
pub fn find_paths(graph: &PoolGraph, source_token: &str, target_token: &str, max_hops: usize) -> Vec<Vec<PoolEdge>> {
    let mut results: Vec<Vec<PoolEdge>> = Vec::new();
    if max_hops == 0 {
        return results;
    }

    type SearchState = (String, Vec<PoolEdge>, HashSet<String>, HashSet<u64>);
    let mut queue: VecDeque<SearchState> = VecDeque::new();
    queue.push_back((
        source_token.to_string(),
        Vec::new(),
        HashSet::from([source_token.to_string()]),
        HashSet::new(),
    ));

    while let Some((current, path, visited, used_pools)) = queue.pop_front() {
        let Some(edges) = graph.adjacency.get(current.as_str()) else {
            continue;
        };
        for edge in edges {
            if used_pools.contains(&edge.pool_id) {
                continue;
            }

            if edge.token_out == target_token {
                let mut complete_path = path.clone();
                complete_path.push(edge.clone());
                results.push(complete_path);
            } else if path.len() + 1 < max_hops && !visited.contains(&edge.token_out) {
                let mut new_visited = visited.clone();
                new_visited.insert(edge.token_out.clone());
                let mut new_pools = used_pools.clone();
                new_pools.insert(edge.pool_id);
                let mut new_path = path.clone();
                new_path.push(edge.clone());
                queue.push_back((edge.token_out.clone(), new_path, new_visited, new_pools));
            }
        }
    }

    results
}

/// Quote a path by chaining each hop's output into the next.
///
/// Returns `None` if any hop produces zero output.
pub fn quote_path(path: &[PoolEdge], amount_in: u128, origin: RouteOrigin) -> Option<Vec<SwapStep>> {
    if path.is_empty() || amount_in == 0 {
        return None;
    }

    let mut current = amount_in;
    let mut steps = Vec::with_capacity(path.len());
    for edge in path {
        let estimate = edge.quote(current);
        if estimate == 0 {
            return None;
        }
        steps.push(SwapStep {
            pool_id: edge.pool_id,
            pool_kind: edge.pool_kind,
            token_in: edge.token_in.clone(),
            token_out: edge.token_out.clone(),
            amount_in: current,
            estimate,
            origin,
        });
        current = estimate;
    }

    Some(steps)
}

/// Highest-output quoted path. Ties keep the earlier path, which is the one
/// with fewer hops or, at equal hops, the first in scan order.
pub fn best_route(paths: &[Vec<PoolEdge>], amount_in: u128, origin: RouteOrigin) -> Option<Vec<SwapStep>> {
    let mut best: Option<(u128, Vec<SwapStep>)> = None;
    for steps in paths.iter().filter_map(|p| quote_path(p, amount_in, origin)) {
        let output = steps.last().map_or(0, |s| s.estimate);
        if best.as_ref().map_or(true, |(top, _)| output > *top) {
            best = Some((output, steps));
        }
    }
    best.map(|(_, steps)| steps)
}

/// Split a route into its parallel paths
pub fn split_paths(route: &[SwapStep]) -> Vec<&[SwapStep]> {
    let mut paths = Vec::new();
    let mut start = 0;
    for i in 1..route.len() {
        if route[i].token_in != route[i - 1].token_out {
            paths.push(&route[start..i]);
            start = i;
        }
    }
    if !route.is_empty() {
        paths.push(&route[start..]);
    }
    paths
}

/// Expected output of a route: the last estimate of every path
pub fn route_output(route: &[SwapStep]) -> u128 {
    split_paths(route)
        .iter()
        .filter_map(|path| path.last())
        .map(|step| step.estimate)
        .sum()
}

fn path_output(path: &[PoolEdge], amount_in: u128) -> u128 {
    if amount_in == 0 {
        return 0;
    }
    path.iter().try_fold(amount_in, |current, edge| match edge.quote(current) {
        0 => None,
        out => Some(out),
    })
    .unwrap_or(0)
}

/// Turn permille shares into amounts summing exactly to `total`.
/// Rounding dust goes to the last path with a non-zero share.
fn allocate(total: u128, permille: &[u128]) -> Vec<u128> {
    let mut amounts: Vec<u128> = permille
        .iter()
        .map(|&p| total / 1000 * p + total % 1000 * p / 1000)
        .collect();
    let dust = total - amounts.iter().sum::<u128>();
    if let Some(i) = permille.iter().rposition(|&p| p > 0) {
        amounts[i] += dust;
    }
    amounts
}

fn split_output(paths: &[&[PoolEdge]], total: u128, permille: &[u128]) -> u128 {
    allocate(total, permille)
        .into_iter()
        .zip(paths)
        .map(|(amount, path)| path_output(path, amount))
        .sum()
}

/// Permille of `total` sent down each path, maximizing the summed output.
///
/// Paths come ranked best first; ties keep input on the better-ranked path.
pub fn optimize_split(paths: &[&[PoolEdge]], total: u128) -> Vec<u128> {
    match paths.len() {
        0 => Vec::new(),
        1 => vec![1000],
        2 => optimize_split_two(paths, total),
        _ => optimize_split_multi(paths, total),
    }
}

/// Grid search over the share of the first path
fn optimize_split_two(paths: &[&[PoolEdge]], total: u128) -> Vec<u128> {
    let mut best = (split_output(paths, total, &[1000, 0]), 1000);
    let mut share = 1000;
    while share >= SPLIT_STEP_PERMILLE {
        share -= SPLIT_STEP_PERMILLE;
        let output = split_output(paths, total, &[share, 1000 - share]);
        if output > best.0 {
            best = (output, share);
        }
    }
    vec![best.1, 1000 - best.1]
}

/// Pairwise transfers between paths, starting from everything on the best
/// path and halving the transfer size whenever no move improves the output.
fn optimize_split_multi(paths: &[&[PoolEdge]], total: u128) -> Vec<u128> {
    let mut shares = vec![0; paths.len()];
    shares[0] = 1000;
    let mut best = split_output(paths, total, &shares);
    let mut step = 100;

    while step >= SPLIT_STEP_PERMILLE {
        let mut improved = None;
        for from in 0..shares.len() {
            if shares[from] < step {
                continue;
            }
            for to in (0..shares.len()).filter(|&to| to != from) {
                let mut candidate = shares.clone();
                candidate[from] -= step;
                candidate[to] += step;
                let output = split_output(paths, total, &candidate);
                if output > improved.as_ref().map_or(best, |(top, _)| *top) {
                    improved = Some((output, candidate));
                }
            }
        }
        match improved {
            Some((output, candidate)) => {
                best = output;
                shares = candidate;
            }
            None => step /= 2,
        }
    }
    shares
}

/// Spread `amount_in` across up to `MAX_SPLIT_PATHS` pool-disjoint paths.
///
/// Returns `None` unless the split beats `single_output` by
/// `MIN_SPLIT_GAIN_BPS`, so near-ties stay on one path.
pub fn aggregate_route(
    paths: &[Vec<PoolEdge>],
    amount_in: u128,
    single_output: u128,
    origin: RouteOrigin,
) -> Option<Vec<SwapStep>> {
    let mut ranked: Vec<(u128, &Vec<PoolEdge>)> = paths
        .iter()
        .map(|path| (path_output(path, amount_in), path))
        .filter(|(output, _)| *output > 0)
        .collect();
    // Stable sort: equal outputs keep fewest hops, then scan order
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let mut used_pools: HashSet<u64> = HashSet::new();
    let mut chosen: Vec<&[PoolEdge]> = Vec::new();
    for (_, path) in ranked {
        if chosen.len() == MAX_SPLIT_PATHS {
            break;
        }
        if path.iter().any(|edge| used_pools.contains(&edge.pool_id)) {
            continue;
        }
        used_pools.extend(path.iter().map(|edge| edge.pool_id));
        chosen.push(path.as_slice());
    }
    if chosen.len() < 2 {
        return None;
    }

    let shares = optimize_split(&chosen, amount_in);
    let mut steps = Vec::new();
    let mut legs = 0;
    for (path, amount) in chosen.iter().zip(allocate(amount_in, &shares)) {
        if amount > 0 {
            steps.extend(quote_path(path, amount, origin)?);
            legs += 1;
        }
    }
    if legs < 2 {
        return None;
    }

    let output = route_output(&steps);
    let gain = output.saturating_sub(single_output);
    if gain.saturating_mul(10_000) <= single_output.saturating_mul(MIN_SPLIT_GAIN_BPS) {
        return None;
    }
    debug!(legs, output = %output, single_output = %single_output, "Split route beats single path");
    Some(steps)
}

/// One estimation attempt.
///
/// `smart` routes across stable and simple pools up to `max_hops` and may
/// split the input; otherwise only the best direct simple pool is used.
pub fn estimate(
    token_in: &str,
    token_out: &str,
    amount_in: u128,
    market: &MarketState,
    smart: bool,
    max_hops: usize,
) -> Result<Vec<SwapStep>, RouteError> {
    let (graph, hops, origin) = if smart {
        (build_pool_graph(market, true, DEFAULT_MAX_POOLS_PER_PAIR)?, max_hops, RouteOrigin::Smart)
    } else {
        (build_pool_graph(market, false, DEFAULT_MAX_POOLS_PER_PAIR)?, 1, RouteOrigin::Simple)
    };

    let paths = find_paths(&graph, token_in, token_out, hops);
    debug!(token_in, token_out, smart, paths = paths.len(), pools = graph.pool_count, "Candidate paths");
    if paths.is_empty() {
        return Err(RouteError::NoPoolAvailable {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
        });
    }

    let best = best_route(&paths, amount_in, origin).ok_or_else(|| RouteError::InsufficientLiquidity {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
    })?;
    if !smart {
        return Ok(best);
    }
    Ok(aggregate_route(&paths, amount_in, route_output(&best), origin).unwrap_or(best))
}

/// Smart attempt, then exactly one simple retry if it fails.
///
/// `attempt(true)` is the smart attempt. The attempts run one after the
/// other; a smart success is returned as-is.
pub fn estimate_with_fallback<F>(smart_enabled: bool, mut attempt: F) -> Result<Vec<SwapStep>, SwapError>
where
    F: FnMut(bool) -> Result<Vec<SwapStep>, RouteError>,
{
    let smart = if smart_enabled {
        match attempt(true) {
            Ok(steps) => return Ok(steps),
            Err(err) => {
                warn!(error = %err, "Smart routing failed, retrying with simple pools");
                err
            }
        }
    } else {
        RouteError::SmartRoutingDisabled
    };

    attempt(false).map_err(|fallback| SwapError::RoutingFailed { smart, fallback })
}
