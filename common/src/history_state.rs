//! Saved facet state as stored in browser history entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::facets_filter::FacetsFilter;
use crate::query_generator::QueryTerms;

/// Saved state of one facet filter.
///
/// `paths` maps a value id to the ids of its ancestors, for values that are
/// only reachable after expanding their parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterState {
    #[serde(flatten)]
    pub terms: QueryTerms,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, Vec<String>>,
}

impl FilterState {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { terms: QueryTerms::new(include, exclude), paths: BTreeMap::new() }
    }

    pub fn with_path(mut self, value: impl Into<String>, path: Vec<String>) -> Self {
        self.paths.insert(value.into(), path);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn path_of(&self, value: &str) -> &[String] {
        self.paths.get(value).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// State of one filter, keyed by the key the filter reports its state under.
pub type FilterStateMap = BTreeMap<String, FilterState>;

/// Facet name -> filter state.
pub type EngineState = BTreeMap<String, FilterStateMap>;

/// Per-entry browser history state: `{path, facetsFilter, userQuery}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub path: String,
    pub facets_filter: FacetsFilter,
    pub user_query: String,
    /// Engine state with ancestor paths of nested values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_state: Option<EngineState>,
}

impl HistoryState {
    /// Engine state to replay: the stored one, or one derived from the
    /// facets filter when the entry carries none.
    pub fn engine_state(&self) -> EngineState {
        match &self.engine_state {
            Some(state) => state.clone(),
            None => self.facets_filter.to_engine_state(),
        }
    }
}
