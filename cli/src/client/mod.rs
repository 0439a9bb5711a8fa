//! Defender for Endpoint API client.

pub mod api;
pub mod middleware;

pub use api::{DefenderApi, DefenderClient};
#[cfg(test)]
pub use api::MockDefenderApi;
