use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PROBE_URL: &str = "https://www.gstatic.com/generate_204";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Best-effort network reachability check
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Must resolve within `timeout`
    async fn is_online(&self, timeout: Duration) -> bool;
}

/// Probe that issues a HEAD request to a well-known endpoint
pub struct HttpProbe {
    url: String,
    client: Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build probe HTTP client")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn is_online(&self, timeout: Duration) -> bool {
        let request = self.client.head(&self.url).timeout(timeout).send();

        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => {
                debug!("Probe {} answered {}", self.url, response.status());
                true
            }
            Ok(Err(e)) => {
                debug!("Probe {} failed: {}", self.url, e);
                false
            }
            Err(_) => {
                debug!("Probe {} timed out after {:?}", self.url, timeout);
                false
            }
        }
    }
}

/// Probe with a fixed answer, for offline mode and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

#[async_trait]
impl ReachabilityProbe for FixedProbe {
    async fn is_online(&self, _timeout: Duration) -> bool {
        self.0
    }
}
