use common::facet_value::{FacetOptionList, FacetValue};
use tracing::{debug, warn};

use crate::http_utils::invenio_client::InvenioClient;
use crate::http_utils::response_cache::{cache_key, get_cached_response, insert_cache};

/// `GET <facet_url>?parent=<value-id>&limit=<n>`; top level values when
/// `parent` is `None`. A payload of an unexpected shape yields no values.
pub async fn fetch_facet_options(
    client: &InvenioClient,
    facet_url: &str,
    parent: Option<&str>,
) -> anyhow::Result<Vec<FacetValue>> {
    let limit = client.config().facet_limit.to_string();
    let mut params = Vec::with_capacity(2);
    if let Some(parent) = parent {
        params.push(("parent", parent));
    }
    params.push(("limit", limit.as_str()));
    let url = client.build_url(facet_url, &params)?;

    let key = cache_key(url.as_str());
    let payload = match get_cached_response(&key) {
        Some(payload) => {
            debug!(%url, "FACET CACHE HIT: {}", key);
            payload
        }
        None => {
            let payload = client.get_text(&url).await?;
            if let Err(e) = insert_cache(key, payload.clone()) {
                warn!("FACET CACHE INSERT FAILED: {e:#}");
            }
            payload
        }
    };

    Ok(FacetOptionList::parse_lenient(&payload))
}
