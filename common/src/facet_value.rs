//! Facet values as returned by the facet option list endpoint.

use serde::{Deserialize, Serialize};

/// One selectable value of a facet, e.g. the collection "Reports".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub records_num: u64,
    #[serde(default)]
    pub is_expandable: bool,
    /// Ancestor ids, empty for top level values. Filled in by the engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_path: Vec<String>,
}

impl FacetValue {
    pub fn new(id: impl Into<String>, label: impl Into<String>, records_num: u64) -> Self {
        Self { id: id.into(), label: label.into(), records_num, is_expandable: false, parent_path: vec![] }
    }
    pub fn expandable(id: impl Into<String>, label: impl Into<String>, records_num: u64) -> Self {
        Self { is_expandable: true, ..Self::new(id, label, records_num) }
    }
    pub fn record_count(&self) -> u64 {
        self.records_num
    }
}

/// Response of `GET <facet.url>[?parent=<value-id>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FacetOptionList {
    pub facet: Vec<FacetValue>,
}

impl FacetOptionList {
    /// Parses an option list payload.
    ///
    /// A payload without a `facet` array, or with any entry of an unexpected
    /// shape, counts as zero values. Half-parsed lists are never returned.
    pub fn parse_lenient(payload: &str) -> Vec<FacetValue> {
        match serde_json::from_str::<FacetOptionList>(payload) {
            Ok(list) => list.facet,
            Err(_) => vec![],
        }
    }
}

/// Static facet description provided by the page: `{facet, title, url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetConfig {
    pub facet: String,
    pub title: String,
    pub url: String,
}

impl FacetConfig {
    pub fn new(facet: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { facet: facet.into(), title: title.into(), url: url.into() }
    }

    /// Parses the facet list the page embeds as JSON.
    pub fn parse_list(json: &str) -> serde_json::Result<Vec<FacetConfig>> {
        serde_json::from_str(json)
    }
}
