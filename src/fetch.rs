//! HTTP collaborator used to download remote assets.

use anyhow::{Context, Result};
use log::debug;

/// Contract for retrieving remote content.
///
/// Implementations fail on any non-success response and perform no retries
/// of their own; the engine treats every failure as terminal for the run.
pub trait Fetcher {
    /// Download the content behind `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
///
/// No timeout is imposed beyond the client defaults; the engine is
/// synchronous and simply waits.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default client configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("fetching {url}");
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("unexpected status fetching {url}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read response body from {url}"))?;
        Ok(bytes.to_vec())
    }
}
