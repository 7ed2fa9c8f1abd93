//! Ref Swap Calculator
//!
//! Constant-product math for simple pools and the stable-swap invariant for
//! stable and rated pools. All arithmetic runs on `BigInt` so reserves near
//! `u128::MAX` cannot overflow intermediate products.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::constants::{fees::FEE_DIVISOR, stable};
use crate::state::StablePoolDetail;

/// Calculate swap output for a constant-product pool
///
/// Formula: output = (reserves_out * input * (D - fee)) / (reserves_in * D + input * (D - fee))
/// with `D = FEE_DIVISOR` and `fee` in basis points.
pub fn calculate_output(reserves_in: u128, reserves_out: u128, input_amount: u128, total_fee: u32) -> u128 {
    if reserves_in == 0 || reserves_out == 0 || input_amount == 0 || total_fee >= FEE_DIVISOR {
        return 0;
    }

    let amount_with_fee = BigInt::from(input_amount) * BigInt::from(FEE_DIVISOR - total_fee);
    let numerator = &amount_with_fee * BigInt::from(reserves_out);
    let denominator = BigInt::from(reserves_in) * BigInt::from(FEE_DIVISOR) + amount_with_fee;

    (numerator / denominator).to_u128().unwrap_or(0)
}

/// Minimum acceptable output: `floor(estimate * (1 - tolerance))`
///
/// The tolerance is taken at basis-point precision.
pub fn apply_slippage(estimate: u128, tolerance: f64) -> u128 {
    let bps = (tolerance.clamp(0.0, 1.0) * FEE_DIVISOR as f64).round() as u32;
    let kept = BigInt::from(estimate) * BigInt::from(FEE_DIVISOR - bps) / BigInt::from(FEE_DIVISOR);
    kept.to_u128().unwrap_or(0)
}

fn pow10(exp: u8) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exp as usize)
}

/// Scale a token amount to the 18-decimal comparable precision
pub fn to_comparable(amount: &BigInt, decimals: u8) -> BigInt {
    if decimals <= stable::TARGET_DECIMALS {
        amount * pow10(stable::TARGET_DECIMALS - decimals)
    } else {
        amount / pow10(decimals - stable::TARGET_DECIMALS)
    }
}

/// Scale a comparable amount back to token precision
pub fn from_comparable(amount: &BigInt, decimals: u8) -> BigInt {
    if decimals <= stable::TARGET_DECIMALS {
        amount / pow10(stable::TARGET_DECIMALS - decimals)
    } else {
        amount * pow10(decimals - stable::TARGET_DECIMALS)
    }
}

/// `Ann = amp * n^n`
fn leverage(amp: u64, n: usize) -> BigInt {
    BigInt::from(amp) * num_traits::pow(BigInt::from(n), n)
}

/// Stable-swap invariant `D` for balances `xp`
///
/// Newton iteration, stops once consecutive values differ by at most one.
pub fn stable_invariant(xp: &[BigInt], amp: u64) -> Option<BigInt> {
    let n = xp.len();
    if n < 2 || amp == 0 || xp.iter().any(|x| !x.is_positive()) {
        return None;
    }

    let n_big = BigInt::from(n);
    let sum: BigInt = xp.iter().sum();
    let ann = leverage(amp, n);
    let mut d = sum.clone();

    for _ in 0..stable::MAX_ITERATIONS {
        let mut d_prod = d.clone();
        for x in xp {
            d_prod = d_prod * &d / (x * &n_big);
        }
        let d_prev = d.clone();
        let numerator = &d_prev * (&d_prod * &n_big + &ann * &sum);
        let denominator = &d_prev * (&ann - BigInt::one()) + &d_prod * (&n_big + BigInt::one());
        if denominator.is_zero() {
            return None;
        }
        d = numerator / denominator;
        if (&d - &d_prev).abs() <= BigInt::one() {
            return Some(d);
        }
    }

    Some(d)
}

/// Balance of token `j` that keeps `D` fixed once token `i` holds `x_new`
pub fn stable_y(xp: &[BigInt], i: usize, j: usize, x_new: &BigInt, d: &BigInt, amp: u64) -> Option<BigInt> {
    let n = xp.len();
    if i == j || i >= n || j >= n || !x_new.is_positive() {
        return None;
    }

    let ann = leverage(amp, n);
    let mut s = x_new.clone();
    let mut c = d * d / x_new;
    for (k, x) in xp.iter().enumerate() {
        if k != i && k != j {
            s += x;
            c = c * d / x;
        }
    }
    c = c * d / (&ann * num_traits::pow(BigInt::from(n), n));
    let b = d / &ann + s;

    let mut y = d.clone();
    for _ in 0..stable::MAX_ITERATIONS {
        let y_prev = y.clone();
        let denominator = BigInt::from(2u8) * &y + &b - d;
        if !denominator.is_positive() {
            return None;
        }
        y = (&y * &y + &c) / denominator;
        if (&y - &y_prev).abs() <= BigInt::one() {
            break;
        }
    }

    Some(y)
}

/// Swap output for a stable or rated pool, in output-token base units
///
/// Balances are compared at 18 decimals and, for rated pools, scaled by the
/// token rate. The pool fee is taken from the output.
pub fn calculate_stable_output(
    detail: &StablePoolDetail,
    token_in: &str,
    token_out: &str,
    amount_in: u128,
) -> Option<u128> {
    let i = detail.token_index(token_in)?;
    let j = detail.token_index(token_out)?;
    let n = detail.c_amounts.len();
    if i == j || amount_in == 0 || n < 2 || detail.decimals.len() != n {
        return None;
    }

    let precision = pow10(stable::RATE_DECIMALS);
    let rates: Vec<BigInt> = if detail.rates.len() == n {
        detail.rates.iter().map(|r| BigInt::from(*r)).collect()
    } else {
        vec![precision.clone(); n]
    };
    if rates.iter().any(|r| !r.is_positive()) {
        return None;
    }

    let xp: Vec<BigInt> = detail
        .c_amounts
        .iter()
        .zip(&rates)
        .map(|(c, rate)| BigInt::from(*c) * rate / &precision)
        .collect();

    let dx = to_comparable(&BigInt::from(amount_in), detail.decimals[i]) * &rates[i] / &precision;
    let d = stable_invariant(&xp, detail.amp)?;
    let y = stable_y(&xp, i, j, &(&xp[i] + dx), &d, detail.amp)?;
    if y >= xp[j] {
        return None;
    }

    let dy = &xp[j] - y;
    let fee = &dy * BigInt::from(detail.total_fee) / BigInt::from(FEE_DIVISOR);
    let dy_c = (dy - fee) * &precision / &rates[j];
    let out = from_comparable(&dy_c, detail.decimals[j]);

    out.to_u128().filter(|v| *v > 0)
}
