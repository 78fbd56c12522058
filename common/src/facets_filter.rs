//! The serializable record of which facet values are included or excluded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::facet_state::FacetChangeState;
use crate::history_state::{EngineState, FilterState};
use crate::query_generator::{QueryData, QueryTerms};

/// Included and excluded values of one facet, in activation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterEntry {
    #[serde(default)]
    pub inc: Vec<String>,
    #[serde(default)]
    pub exc: Vec<String>,
}

impl FilterEntry {
    pub fn is_empty(&self) -> bool {
        self.inc.is_empty() && self.exc.is_empty()
    }
}

/// One operation of a [`FacetsFilter::apply`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetsFilterOp {
    Include { facet: String, value: String },
    Exclude { facet: String, value: String },
    Reset { facet: String, value: String },
}

/// Mapping facet name -> `{inc, exc}`.
///
/// A facet is present iff it has at least one included or excluded value:
/// serialisation downstream treats "entry present" as "facet constrained".
/// Missing facets and values are no-ops, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "BTreeMap<String, FilterEntry>", into = "BTreeMap<String, FilterEntry>")]
pub struct FacetsFilter {
    filters: BTreeMap<String, FilterEntry>,
}

impl From<BTreeMap<String, FilterEntry>> for FacetsFilter {
    fn from(filters: BTreeMap<String, FilterEntry>) -> Self {
        let mut f = FacetsFilter { filters };
        f.prune();
        f
    }
}

impl From<FacetsFilter> for BTreeMap<String, FilterEntry> {
    fn from(f: FacetsFilter) -> Self {
        f.filters
    }
}

impl FacetsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the live map, for iteration.
    pub fn filters(&self) -> &BTreeMap<String, FilterEntry> {
        &self.filters
    }

    /// Owned copy of the current map.
    pub fn snapshot(&self) -> BTreeMap<String, FilterEntry> {
        self.filters.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, facet: &str) -> Option<&FilterEntry> {
        self.filters.get(facet)
    }

    /// Returns the entry of `facet`, inserting `{inc: [], exc: []}` if needed.
    ///
    /// An entry left empty by the caller lingers until the next reset or
    /// [`FacetsFilter::prune`].
    pub fn get_or_create_filter(&mut self, facet: &str) -> &mut FilterEntry {
        self.filters.entry(facet.to_string()).or_default()
    }

    /// Appends `value` to the included values. Duplicates are not checked
    /// here; callers reset the value first.
    pub fn include_facet_value(&mut self, facet: &str, value: &str) {
        self.get_or_create_filter(facet).inc.push(value.to_string());
    }

    pub fn exclude_facet_value(&mut self, facet: &str, value: &str) {
        self.get_or_create_filter(facet).exc.push(value.to_string());
    }

    /// Removes `value` from both lists, dropping the facet once it is empty.
    pub fn reset_facet_value(&mut self, facet: &str, value: &str) {
        let Some(entry) = self.filters.get_mut(facet) else {
            return;
        };
        entry.inc.retain(|v| v != value);
        entry.exc.retain(|v| v != value);
        if entry.is_empty() {
            self.filters.remove(facet);
        }
    }

    /// Resets `value` and re-applies the given status.
    pub fn set_facet_state(&mut self, facet: &str, value: &str, state: FacetChangeState) {
        self.reset_facet_value(facet, value);
        match state {
            FacetChangeState::Include => self.include_facet_value(facet, value),
            FacetChangeState::Exclude => self.exclude_facet_value(facet, value),
            FacetChangeState::Default => {}
        }
    }

    /// Applies a batch of operations in order.
    pub fn apply(&mut self, ops: impl IntoIterator<Item = FacetsFilterOp>) {
        for op in ops {
            match op {
                FacetsFilterOp::Include { facet, value } => self.include_facet_value(&facet, &value),
                FacetsFilterOp::Exclude { facet, value } => self.exclude_facet_value(&facet, &value),
                FacetsFilterOp::Reset { facet, value } => self.reset_facet_value(&facet, &value),
            }
        }
        self.prune();
    }

    /// Drops every empty entry.
    pub fn prune(&mut self) {
        self.filters.retain(|_, entry| !entry.is_empty());
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// `inc` becomes `+`, `exc` becomes `-`.
    pub fn to_query_data(&self) -> QueryData {
        self.filters
            .iter()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(facet, entry)| {
                (facet.clone(), QueryTerms { include: entry.inc.clone(), exclude: entry.exc.clone() })
            })
            .collect()
    }

    /// Engine state keyed by facet name, without ancestor paths.
    pub fn to_engine_state(&self) -> EngineState {
        self.filters
            .iter()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(facet, entry)| {
                let state = FilterState::new(entry.inc.clone(), entry.exc.clone());
                (facet.clone(), BTreeMap::from([(facet.clone(), state)]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_include_then_exclude_after_reset() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("year", "2001");
        f.set_facet_state("year", "2001", FacetChangeState::Exclude);
        let entry = f.get("year").unwrap();
        assert!(!entry.inc.contains(&"2001".to_string()));
        assert_eq!(entry.exc, vec!["2001".to_string()]);

        f.set_facet_state("year", "2001", FacetChangeState::Include);
        let entry = f.get("year").unwrap();
        assert_eq!(entry.inc, vec!["2001".to_string()]);
        assert!(entry.exc.is_empty());
    }

    #[test]
    fn test_include_permits_duplicates() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("year", "2001");
        f.include_facet_value("year", "2001");
        assert_eq!(f.get("year").unwrap().inc.len(), 2);
        f.reset_facet_value("year", "2001");
        assert!(f.get("year").is_none());
    }

    #[test]
    fn test_reset_prunes_empty_entries() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("collection", "Reports");
        f.exclude_facet_value("collection", "Multimedia");
        f.include_facet_value("year", "2000");

        f.reset_facet_value("collection", "Reports");
        assert!(f.filters().contains_key("collection"));
        f.reset_facet_value("collection", "Multimedia");
        assert!(!f.filters().contains_key("collection"));
        assert_eq!(f.filters().keys().collect::<Vec<_>>(), vec!["year"]);
    }

    #[test]
    fn test_reset_missing_is_noop() {
        let mut f = FacetsFilter::new();
        f.reset_facet_value("nope", "x");
        f.include_facet_value("year", "2000");
        f.reset_facet_value("year", "1999");
        assert_eq!(f.get("year").unwrap().inc, vec!["2000".to_string()]);
    }

    #[test]
    fn test_apply_batch_prunes() {
        let mut f = FacetsFilter::new();
        let _ = f.get_or_create_filter("author");
        f.apply(vec![
            FacetsFilterOp::Include { facet: "year".into(), value: "2000".into() },
            FacetsFilterOp::Exclude { facet: "year".into(), value: "2001".into() },
            FacetsFilterOp::Reset { facet: "year".into(), value: "2000".into() },
        ]);
        assert!(f.get("author").is_none());
        assert_eq!(f.get("year").unwrap(), &FilterEntry { inc: vec![], exc: vec!["2001".into()] });
    }

    #[test]
    fn test_serde_shape_and_pruning_on_load() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("year", "2002");
        f.exclude_facet_value("year", "2000");
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"year":{"inc":["2002"],"exc":["2000"]}}"#);

        let loaded: FacetsFilter = serde_json::from_str(r#"{"year":{"inc":["2002"]},"empty":{"inc":[],"exc":[]}}"#).unwrap();
        assert_eq!(loaded.filters().len(), 1);
        assert_eq!(loaded.get("year").unwrap().inc, vec!["2002".to_string()]);
    }

    #[test]
    fn test_to_query_data() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("collection", "Reports");
        f.exclude_facet_value("collection", "Multimedia");
        let data = f.to_query_data();
        let terms = data.get("collection").unwrap();
        assert_eq!(terms.include, vec!["Reports".to_string()]);
        assert_eq!(terms.exclude, vec!["Multimedia".to_string()]);
    }

    #[test]
    fn test_to_engine_state_keys_by_facet() {
        let mut f = FacetsFilter::new();
        f.include_facet_value("year", "2002");
        let state = f.to_engine_state();
        assert_eq!(state["year"]["year"].terms.include, vec!["2002".to_string()]);
        assert!(state["year"]["year"].paths.is_empty());
    }
}
