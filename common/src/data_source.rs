//! Interfaces of the remote endpoints the search page consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::facet_value::FacetValue;

/// Facet option list endpoint: `GET <url>[?parent=<value-id>]`.
#[async_trait(?Send)]
pub trait FacetOptionSource {
    /// Top level values when `parent` is `None`.
    async fn fetch_options(&self, url: &str, parent: Option<&str>) -> anyhow::Result<Vec<FacetValue>>;
}

/// Search results endpoint, answering with an HTML partial.
#[async_trait(?Send)]
pub trait ResultsSource {
    async fn fetch_results(&self, request: &ResultsRequest) -> anyhow::Result<String>;
}

/// One results fetch issued by the search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsRequest {
    /// Increases with every request; responses to older ones are dropped.
    pub generation: u64,
    pub path: String,
    pub user_query_param: String,
    pub user_query: String,
    pub facets_filter_query_param: String,
    pub facets_query: String,
}

impl ResultsRequest {
    /// Query string parameters of the request, in order.
    pub fn params(&self) -> Vec<(&str, &str)> {
        vec![
            (self.user_query_param.as_str(), self.user_query.as_str()),
            (self.facets_filter_query_param.as_str(), self.facets_query.as_str()),
        ]
    }
}
