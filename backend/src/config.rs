//! Settings read from the environment.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvenioConfig {
    /// Base the relative facet and search urls are resolved against.
    pub base_url: String,
    /// `limit` parameter of option list requests.
    pub facet_limit: usize,
    pub timeout: Duration,
    /// Extra attempts after the first failed one.
    pub retries: u32,
    /// Delay before the first retry, doubled for each following one.
    pub backoff: Duration,
}

impl Default for InvenioConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            facet_limit: 20,
            timeout: Duration::from_millis(10_000),
            retries: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring invalid {}: {:?}", name, value);
            None
        }
    }
}

impl InvenioConfig {
    /// `INVENIO_URL`, `INVENIO_FACET_LIMIT`, `INVENIO_HTTP_TIMEOUT_MS` and
    /// `INVENIO_HTTP_RETRIES`, falling back to the defaults.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("INVENIO_URL").unwrap_or(default.base_url),
            facet_limit: env_parse("INVENIO_FACET_LIMIT").unwrap_or(default.facet_limit),
            timeout: env_parse("INVENIO_HTTP_TIMEOUT_MS").map(Duration::from_millis).unwrap_or(default.timeout),
            retries: env_parse("INVENIO_HTTP_RETRIES").unwrap_or(default.retries),
            backoff: default.backoff,
        }
    }

    /// Backoff before retry number `attempt` (starting at 1).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1 << attempt.saturating_sub(1).min(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backoff_doubles() {
        let config = InvenioConfig { backoff: Duration::from_millis(100), ..Default::default() };
        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(400));
    }
}
