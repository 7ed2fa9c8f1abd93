//! Token Resolver
//!
//! Maps free-form identifiers ("usdc", "Wrapped NEAR", "wrap.near", "near")
//! to a token. Matching runs locally against a registry; metadata is then
//! read from the token contract.

use std::sync::Arc;

use refhat_core::constants::NATIVE_TOKEN_ID;
use refhat_core::{is_valid_account_id, AccountId, TokenListEntry};
use tracing::debug;

use crate::sources::TokenMetadataSource;
use crate::state::{SwapError, Token};

/// Well-known tokens listed on Ref, as `(contract id, name, symbol)`
const BUILTIN_TOKENS: &[(&str, &str, &str)] = &[
    ("wrap.near", "Wrapped NEAR fungible token", "wNEAR"),
    ("usdt.tether-token.near", "Tether USD", "USDt"),
    (
        "17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1",
        "USD Coin",
        "USDC",
    ),
    (
        "dac17f958d2ee523a2206206994597c13d831ec7.factory.bridge.near",
        "Tether USD (bridged)",
        "USDT.e",
    ),
    (
        "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near",
        "USD Coin (bridged)",
        "USDC.e",
    ),
    (
        "6b175474e89094c44da98b954eedeac495271d0f.factory.bridge.near",
        "Dai Stablecoin",
        "DAI",
    ),
    (
        "2260fac5e5542a773aa44fbcfedf7c193bc2c599.factory.bridge.near",
        "Wrapped BTC",
        "WBTC",
    ),
    ("aurora", "Ether", "ETH"),
    ("token.v2.ref-finance.near", "Ref Finance Token", "REF"),
    ("meta-pool.near", "Staked NEAR", "STNEAR"),
    ("linear-protocol.near", "LiNEAR", "LINEAR"),
    ("token.burrow.near", "Burrow Token", "BRRR"),
    ("token.sweat", "SWEAT", "SWEAT"),
    ("hat.tkn.near", "HAT", "HAT"),
    ("blackdragon.tkn.near", "Black Dragon", "BLACKDRAGON"),
    ("token.0xshitzu.near", "Shitzu", "SHITZU"),
    ("intel.tkn.near", "NEAR AI", "INTEL"),
    ("ftv2.nekotoken.near", "NEKO", "NEKO"),
    (
        "f5cfbc74057c610c8ef151a439252680ac68c6dc.factory.bridge.near",
        "Octopus Network Token",
        "OCT",
    ),
];

/// Match scores, highest wins
mod score {
    pub const EXACT_ID: u32 = 100;
    pub const EXACT_SYMBOL: u32 = 90;
    pub const EXACT_NAME: u32 = 80;
    pub const LITERAL_ACCOUNT: u32 = 70;
    pub const SYMBOL_PREFIX: u32 = 60;
    pub const NAME_PREFIX: u32 = 50;
    pub const SYMBOL_CONTAINS: u32 = 40;
    pub const NAME_CONTAINS: u32 = 30;
}

/// Result of matching an identifier, before any I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatch {
    /// The native NEAR pseudo-token
    Native,
    /// A fungible token contract
    Contract(String),
}

impl TokenMatch {
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Contract used when routing through Ref (native trades as wrapped NEAR)
    pub fn routing_id<'a>(&'a self, wrap_near_id: &'a str) -> &'a str {
        match self {
            Self::Native => wrap_near_id,
            Self::Contract(id) => id,
        }
    }
}

/// Searchable token list
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    entries: Vec<TokenListEntry>,
}

impl TokenRegistry {
    pub fn new(entries: Vec<TokenListEntry>) -> Self {
        Self { entries }
    }

    /// Registry seeded with the built-in token list
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_TOKENS
                .iter()
                .map(|(id, name, symbol)| TokenListEntry {
                    id: id.to_string(),
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                })
                .collect(),
        )
    }

    /// Append entries after the existing ones (existing entries win ties)
    pub fn with_extra(mut self, extra: &[TokenListEntry]) -> Self {
        self.entries.extend_from_slice(extra);
        self
    }

    /// Best match for `query`, or `None` when nothing scores above zero
    pub fn search(&self, query: &str) -> Option<TokenMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        if query == NATIVE_TOKEN_ID {
            return Some(TokenMatch::Native);
        }

        let mut best: Option<(u32, &str)> = None;
        for entry in &self.entries {
            let s = score_entry(entry, &query);
            // Strict comparison keeps the earliest entry on ties
            if s > 0 && best.map_or(true, |(top, _)| s > top) {
                best = Some((s, entry.id.as_str()));
            }
        }

        if best.map_or(true, |(top, _)| score::LITERAL_ACCOUNT > top) && looks_like_contract(&query) {
            return Some(TokenMatch::Contract(query));
        }

        best.map(|(_, id)| TokenMatch::Contract(id.to_string()))
    }
}

fn score_entry(entry: &TokenListEntry, query: &str) -> u32 {
    let id = entry.id.to_lowercase();
    let symbol = entry.symbol.to_lowercase();
    let name = entry.name.to_lowercase();

    if id == query {
        score::EXACT_ID
    } else if symbol == query {
        score::EXACT_SYMBOL
    } else if name == query {
        score::EXACT_NAME
    } else if symbol.starts_with(query) {
        score::SYMBOL_PREFIX
    } else if name.starts_with(query) {
        score::NAME_PREFIX
    } else if symbol.contains(query) {
        score::SYMBOL_CONTAINS
    } else if name.contains(query) {
        score::NAME_CONTAINS
    } else {
        0
    }
}

/// A valid account ID that is clearly a contract address rather than a word:
/// either dotted (`token.example.near`) or implicit (64 hex chars).
fn looks_like_contract(query: &str) -> bool {
    is_valid_account_id(query)
        && (query.contains('.') || AccountId::new(query).is_implicit())
}

/// Identifier → token, with metadata from the token contract
#[derive(Clone)]
pub struct TokenResolver {
    registry: TokenRegistry,
    metadata: Arc<dyn TokenMetadataSource>,
}

impl TokenResolver {
    pub fn new(registry: TokenRegistry, metadata: Arc<dyn TokenMetadataSource>) -> Self {
        Self { registry, metadata }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Local match only, no I/O
    pub fn match_identifier(&self, identifier: &str) -> Result<TokenMatch, SwapError> {
        let matched = self
            .registry
            .search(identifier)
            .ok_or_else(|| SwapError::NotFound {
                identifier: identifier.to_string(),
            })?;
        debug!(identifier, ?matched, "Matched token identifier");
        Ok(matched)
    }

    /// Metadata for a match; the native token needs no lookup
    pub async fn metadata(&self, matched: &TokenMatch) -> Result<Token, SwapError> {
        match matched {
            TokenMatch::Native => Ok(Token::native()),
            TokenMatch::Contract(id) => self.metadata.ft_metadata(id).await,
        }
    }

    /// Metadata of the contract a match routes through
    pub async fn routing_metadata(&self, matched: &TokenMatch, wrap_near_id: &str) -> Result<Token, SwapError> {
        match matched {
            TokenMatch::Native => Ok(Token::wrapped_native(wrap_near_id)),
            TokenMatch::Contract(id) => self.metadata.ft_metadata(id).await,
        }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Token, SwapError> {
        let matched = self.match_identifier(identifier)?;
        self.metadata(&matched).await
    }
}
