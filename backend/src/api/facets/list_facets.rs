use anyhow::Context;
use common::facet_value::FacetConfig;

/// Facets offered on the search page: the JSON list in `INVENIO_FACETS`, or
/// collection and year.
pub fn list_facets() -> anyhow::Result<Vec<FacetConfig>> {
    match std::env::var("INVENIO_FACETS") {
        Ok(json) => FacetConfig::parse_list(&json).context("Invalid INVENIO_FACETS"),
        Err(_) => Ok(default_facets()),
    }
}

fn default_facets() -> Vec<FacetConfig> {
    vec![
        FacetConfig::new("collection", "Collection", "/facet/collection/0"),
        FacetConfig::new("year", "Year", "/facet/year/0"),
    ]
}
