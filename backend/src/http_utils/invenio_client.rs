//! HTTP client for the Invenio endpoints, with timeout and retries.

use std::sync::OnceLock;

use anyhow::Context;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::InvenioConfig;

#[derive(Debug, Clone)]
pub struct InvenioClient {
    config: InvenioConfig,
    http: reqwest::Client,
}

impl InvenioClient {
    pub fn new(config: InvenioConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build http client")?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(InvenioConfig::from_env())
    }

    /// Process wide client configured from the environment.
    pub fn shared() -> anyhow::Result<&'static InvenioClient> {
        static SHARED: OnceLock<InvenioClient> = OnceLock::new();
        if let Some(client) = SHARED.get() {
            return Ok(client);
        }
        let client = Self::from_env()?;
        Ok(SHARED.get_or_init(|| client))
    }

    pub fn config(&self) -> &InvenioConfig {
        &self.config
    }

    /// Resolves `path` (absolute, or relative to the base url) and appends
    /// `params` to its query string.
    pub fn build_url(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<Url> {
        let base = Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid INVENIO_URL: {}", self.config.base_url))?;
        let mut url = base.join(path).with_context(|| format!("Invalid endpoint url: {path}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// GETs `url`, retrying transport errors and 5xx answers with
    /// exponential backoff. 4xx answers fail right away.
    pub async fn get_text(&self, url: &Url) -> anyhow::Result<String> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(text) => return Ok(text),
                Err(RequestError::Fatal(e)) => return Err(e),
                Err(RequestError::Retryable(e)) if attempt >= self.config.retries => {
                    return Err(e.context(format!("giving up after {} attempts", attempt + 1)));
                }
                Err(RequestError::Retryable(e)) => {
                    attempt += 1;
                    let delay = self.config.backoff_for(attempt);
                    warn!(%url, attempt, ?delay, "request failed, retrying: {e:#}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &Url) -> Result<String, RequestError> {
        let t0 = std::time::Instant::now();
        let response = self.http.get(url.clone()).send().await.map_err(|e| RequestError::Retryable(e.into()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| RequestError::Retryable(e.into()))?;
        debug!(%url, %status, len = text.len(), "invenio response");
        if status.is_server_error() {
            return Err(RequestError::Retryable(anyhow::anyhow!("Error: {}: {}", status, text)));
        }
        if status.is_client_error() {
            return Err(RequestError::Fatal(anyhow::anyhow!("Error: {}: {}", status, text)));
        }
        info!(%url, "fetched in {}ms", t0.elapsed().as_millis());
        Ok(text)
    }
}

enum RequestError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}
