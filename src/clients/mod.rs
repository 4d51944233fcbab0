pub mod auth;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod pubchem;

pub use error::ClientError;

use std::time::Duration;

/// Builds an HTTP client whose every request is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("SafeChem/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| ClientError::NotConfigured(format!("Failed to build HTTP client: {e}")))
}
