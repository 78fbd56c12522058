//! Endpoint wrappers, and the data source traits implemented on top of them.

use async_trait::async_trait;
use common::data_source::{FacetOptionSource, ResultsRequest, ResultsSource};
use common::facet_value::FacetValue;

use crate::http_utils::invenio_client::InvenioClient;

pub mod facets;
pub mod search;

#[async_trait(?Send)]
impl FacetOptionSource for InvenioClient {
    async fn fetch_options(&self, url: &str, parent: Option<&str>) -> anyhow::Result<Vec<FacetValue>> {
        facets::fetch_facet_options(self, url, parent).await
    }
}

#[async_trait(?Send)]
impl ResultsSource for InvenioClient {
    async fn fetch_results(&self, request: &ResultsRequest) -> anyhow::Result<String> {
        search::fetch_search_results(self, request).await
    }
}
