//! Query-analytics API client.

use anyhow::{Context, Result, bail};
use reqwest::{Method, StatusCode};

use crate::application::ports::AnalyticsApi;
use crate::infra::consul::ServerEndpoint;

/// Production `AnalyticsApi`.
pub struct QanClient {
    endpoint: ServerEndpoint,
}

impl QanClient {
    #[must_use]
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self { endpoint }
    }
}

impl AnalyticsApi for QanClient {
    async fn delete_instance(&self, uuid: &str) -> Result<()> {
        let resp = self
            .endpoint
            .request(Method::DELETE, &format!("qan-api/instances/{uuid}"))
            .send()
            .await
            .with_context(|| format!("deleting analytics instance {uuid}"))?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        bail!("deleting analytics instance {uuid} failed with {status}")
    }
}
