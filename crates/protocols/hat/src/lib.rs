//! HAT Protocol Implementation
//!
//! Read views and unsigned calls for the HAT token's diamond vault and
//! auction contracts.

pub mod constants;
pub mod fetch;
pub mod state;
pub mod tx_builder;

pub use fetch::{HatClient, HatContracts};
pub use state::{
    format_timestamp_ns, AmountInput, AuctionView, BalanceView, ClaimVaultRequest, HatError, LastVaultView,
    VaultDepositRequest, VaultView,
};
pub use tx_builder::{claim_tokens_call, claim_vault_call, start_or_place_bid_call, vault_deposit_call};
