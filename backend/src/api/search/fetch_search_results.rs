use common::data_source::ResultsRequest;
use tracing::info;

use crate::http_utils::invenio_client::InvenioClient;

/// Fetches the results partial for the user query and the compiled facets
/// fragment. Results are never cached.
pub async fn fetch_search_results(client: &InvenioClient, request: &ResultsRequest) -> anyhow::Result<String> {
    let url = client.build_url(&request.path, &request.params())?;
    info!(
        user_query = %request.user_query,
        facets_query = %request.facets_query,
        generation = request.generation,
        "fetching search results"
    );
    client.get_text(&url).await
}
