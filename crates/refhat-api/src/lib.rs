//! Refhat-api: HTTP API layer for Refhat
//!
//! Swap quoting, token lookup and HAT vault/auction endpoints for agents.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
