//! HAT Constants

/// HAT token precision
pub const HAT_DECIMALS: u8 = 18;

/// `msg` that turns a HAT transfer into a vault deposit
pub const INCREASE_DEPOSIT_MSG: &str = r#"{"action_to_execute":"increase_deposit"}"#;

pub mod gas {
    use near_tx::tgas;
    use refhat_core::Gas;

    pub const VAULT_DEPOSIT: Gas = tgas(200);
    pub const CLAIM_VAULT: Gas = tgas(30);
    pub const PLACE_BID: Gas = tgas(30);
    pub const CLAIM_TOKENS: Gas = tgas(300);
}

pub mod deposits {
    use refhat_core::YoctoNear;

    pub const VAULT_DEPOSIT: YoctoNear = 1;
    pub const CLAIM_VAULT: YoctoNear = 0;
    pub const PLACE_BID: YoctoNear = 1;
    /// Storage cover for the claimed tokens (0.00001 NEAR)
    pub const CLAIM_TOKENS: YoctoNear = 10_000_000_000_000_000_000;
}
