pub mod endpoint;

pub use endpoint::{EndpointError, EndpointSelector};

use anyhow::{Context, Result};
use std::time::Duration;

/// Default timeout applied to every request made through a shared client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Timeout for streamed bundle downloads, which can legitimately run long.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Build the shared HTTP client used for catalog and probe traffic.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}
