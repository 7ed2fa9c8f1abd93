//! Core type definitions for Refhat

use serde::{Deserialize, Serialize};
use std::fmt;

/// NEAR account ID (also used for fungible token contracts)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Implicit accounts are 64 lowercase hex characters
    pub fn is_implicit(&self) -> bool {
        self.0.len() == 64 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check NEAR account naming rules.
///
/// 2..=64 chars of `a-z`, `0-9` and the separators `-`, `_`, `.`; a separator
/// can't start or end the ID and two separators can't be adjacent.
pub fn is_valid_account_id(id: &str) -> bool {
    if id.len() < 2 || id.len() > 64 {
        return false;
    }

    let mut last_was_separator = true;
    for c in id.chars() {
        match c {
            'a'..='z' | '0'..='9' => last_was_separator = false,
            '-' | '_' | '.' => {
                if last_was_separator {
                    return false;
                }
                last_was_separator = true;
            }
            _ => return false,
        }
    }

    !last_was_separator
}

/// Amount of yoctoNEAR (1 NEAR = 10^24 yoctoNEAR)
pub type YoctoNear = u128;

/// Gas units (1 TGas = 10^12 gas)
pub type Gas = u64;

/// Constants
pub mod constants {
    use super::{Gas, YoctoNear};

    /// Pseudo token ID for the native asset
    pub const NATIVE_TOKEN_ID: &str = "near";

    /// NEAR decimal places
    pub const NEAR_DECIMALS: u8 = 24;

    /// 1 NEAR in yoctoNEAR
    pub const YOCTO_PER_NEAR: YoctoNear = 1_000_000_000_000_000_000_000_000;

    /// Attached deposit required by NEP-141 transfers
    pub const ONE_YOCTO: YoctoNear = 1;

    /// 1 TGas
    pub const TGAS: Gas = 1_000_000_000_000;

    /// Signer used when the caller doesn't identify itself
    pub const DEFAULT_ACCOUNT_ID: &str = "near";
}

/// Serde helpers for `u128` values carried as decimal strings (NEAR `U128`).
///
/// Deserialization also accepts plain JSON numbers, which some contracts
/// return for small values.
pub mod u128_dec {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(u64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse::<u128>().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n as u128),
            // Amounts past u64 arrive as floats when a contract emits bare numbers
            Raw::Float(f) if f.is_finite() && f >= 0.0 => Ok(f as u128),
            Raw::Float(f) => Err(de::Error::custom(format!("invalid amount {}", f))),
        }
    }

    /// Same as the parent module, for `Vec<u128>`
    pub mod vec {
        use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(values: &[u128], serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for v in values {
                seq.serialize_element(&v.to_string())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u128>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] u128);

            let values = Vec::<Wrapped>::deserialize(deserializer)?;
            Ok(values.into_iter().map(|w| w.0).collect())
        }
    }

    /// Same as the parent module, for `Option<u128>`
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u128>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] u128);

            let value = Option::<Wrapped>::deserialize(deserializer)?;
            Ok(value.map(|w| w.0))
        }
    }
}
