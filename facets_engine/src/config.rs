//! Search page configuration.

use serde::{Deserialize, Serialize};

/// How the search page talks to the search endpoint and lays out facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPageConfig {
    /// Path of the search page and of the results endpoint.
    pub path: String,
    pub user_query_param: String,
    pub facets_filter_query_param: String,
    /// Number of top level options shown before "show more".
    pub page_size: usize,
    /// Holding the modifier key while toggling excludes instead of includes.
    pub exclusion_modifiers: bool,
}

impl Default for SearchPageConfig {
    fn default() -> Self {
        Self {
            path: "/search".to_string(),
            user_query_param: "p".to_string(),
            facets_filter_query_param: "post_filter".to_string(),
            page_size: 5,
            exclusion_modifiers: true,
        }
    }
}

impl SearchPageConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SearchPageConfig::from_json(r#"{"path": "/collection/Articles/search"}"#).unwrap();
        assert_eq!(config.path, "/collection/Articles/search");
        assert_eq!(config.user_query_param, "p");
        assert_eq!(config.facets_filter_query_param, "post_filter");
        assert_eq!(config.page_size, 5);
    }
}
