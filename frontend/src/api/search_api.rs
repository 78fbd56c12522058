//! Client API calls for the facet and search endpoints.

use async_trait::async_trait;
use common::data_source::{FacetOptionSource, ResultsRequest, ResultsSource};
use common::facet_value::{FacetConfig, FacetValue};
use dioxus::prelude::*;

#[server]
pub async fn list_facets() -> Result<Vec<FacetConfig>, ServerFnError> {
    let x = backend::api::facets::list_facets();
    x.map_err(|e| ServerFnError::ServerError { message: e.to_string(), code: 500, details: None })
}

#[server]
pub async fn fetch_facet_options(url: String, parent: Option<String>) -> Result<Vec<FacetValue>, ServerFnError> {
    let client = backend::InvenioClient::shared()
        .map_err(|e| ServerFnError::ServerError { message: e.to_string(), code: 500, details: None })?;
    let x = backend::api::facets::fetch_facet_options(client, &url, parent.as_deref()).await;
    x.map_err(|e| ServerFnError::ServerError { message: format!("{e:#}"), code: 502, details: None })
}

#[server]
pub async fn fetch_search_results(request: ResultsRequest) -> Result<String, ServerFnError> {
    let client = backend::InvenioClient::shared()
        .map_err(|e| ServerFnError::ServerError { message: e.to_string(), code: 500, details: None })?;
    let x = backend::api::search::fetch_search_results(client, &request).await;
    x.map_err(|e| ServerFnError::ServerError { message: format!("{e:#}"), code: 502, details: None })
}

/// Data sources going through the server functions above.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerFnSource;

#[async_trait(?Send)]
impl FacetOptionSource for ServerFnSource {
    async fn fetch_options(&self, url: &str, parent: Option<&str>) -> anyhow::Result<Vec<FacetValue>> {
        fetch_facet_options(url.to_string(), parent.map(str::to_string))
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
    }
}

#[async_trait(?Send)]
impl ResultsSource for ServerFnSource {
    async fn fetch_results(&self, request: &ResultsRequest) -> anyhow::Result<String> {
        fetch_search_results(request.clone()).await.map_err(|e| anyhow::anyhow!("{e}"))
    }
}
