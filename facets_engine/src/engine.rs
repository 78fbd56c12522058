//! All facet filters of one search context.

use std::rc::Rc;

use common::facet_state::{FacetChange, Sign};
use common::facet_value::{FacetConfig, FacetValue};
use common::history_state::EngineState;
use common::query_generator::QueryData;
use tracing::debug;

use crate::error::EngineError;
use crate::facet_filter::{FacetFilter, FetchRequest, FilterActions, FilterOptions, FilterUpdated, UpdateOrigin};
use crate::option_tree::OptionId;
use crate::theme::FacetTheme;

/// One engine level notification: every facet value change caused by a
/// single user action or state replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineUpdate {
    pub origin: UpdateOrigin,
    pub changes: Vec<FacetChange>,
}

impl EngineUpdate {
    fn empty(origin: UpdateOrigin) -> Self {
        Self { origin, changes: Vec::new() }
    }
}

impl From<FilterUpdated> for EngineUpdate {
    fn from(update: FilterUpdated) -> Self {
        Self { origin: update.origin, changes: update.changes }
    }
}

pub struct FacetsEngine {
    filters: Vec<FacetFilter>,
    listeners: Vec<Box<dyn FnMut(&EngineUpdate)>>,
}

impl std::fmt::Debug for FacetsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetsEngine").field("filters", &self.filters).finish_non_exhaustive()
    }
}

impl FacetsEngine {
    /// Builds one filter per facet of the page; each starts loading its
    /// top level options (see [`FacetsEngine::take_fetches`]).
    pub fn new(facets: Vec<FacetConfig>, theme: Rc<dyn FacetTheme>, options: FilterOptions) -> Self {
        let filters = facets.into_iter().map(|config| FacetFilter::new(config, theme.clone(), options)).collect();
        Self { filters, listeners: Vec::new() }
    }

    pub fn filters(&self) -> &[FacetFilter] {
        &self.filters
    }

    pub fn filter(&self, facet: &str) -> Option<&FacetFilter> {
        self.filters.iter().find(|f| f.name() == facet)
    }

    pub fn filter_mut(&mut self, facet: &str) -> Result<&mut FacetFilter, EngineError> {
        self.filters
            .iter_mut()
            .find(|f| f.name() == facet)
            .ok_or_else(|| EngineError::UnknownFacet(facet.to_string()))
    }

    /// Registers an observer called once per engine update.
    pub fn on_updated(&mut self, handler: impl FnMut(&EngineUpdate) + 'static) {
        self.listeners.push(Box::new(handler));
    }

    fn emit(&mut self, update: EngineUpdate) -> EngineUpdate {
        for listener in &mut self.listeners {
            listener(&update);
        }
        update
    }

    /// Facet name -> state of that filter, for active facets only.
    pub fn get_state(&self) -> EngineState {
        self.filters
            .iter()
            .map(|f| (f.name().to_string(), f.get_state()))
            .filter(|(_, state)| !state.is_empty())
            .collect()
    }

    /// The terms of every filter, keyed by filter state key, ready for the
    /// query generator.
    pub fn get_query_structure(&self) -> QueryData {
        self.filters
            .iter()
            .flat_map(|f| f.get_state())
            .map(|(key, state)| (key, state.terms))
            .collect()
    }

    /// Makes the engine state match `saved` exactly: facets absent from it
    /// are deactivated.
    pub fn load_state(&mut self, saved: &EngineState) -> EngineUpdate {
        let mut changes = Vec::new();
        for filter in &mut self.filters {
            let update = match saved.get(filter.name()) {
                Some(state) => filter.load_state(state),
                None => filter.deactivate_all_with(UpdateOrigin::Restore),
            };
            if let Some(update) = update {
                changes.extend(update.changes);
            }
        }
        self.emit(EngineUpdate { origin: UpdateOrigin::Restore, changes })
    }

    pub fn activate(&mut self, facet: &str, option: OptionId, sign: Sign) -> Result<EngineUpdate, EngineError> {
        let update = self.filter_mut(facet)?.activate(option, sign)?;
        Ok(self.emit(update.into()))
    }

    pub fn deactivate(&mut self, facet: &str, option: OptionId) -> Result<EngineUpdate, EngineError> {
        let update = self.filter_mut(facet)?.deactivate(option)?;
        Ok(self.emit(update.into()))
    }

    pub fn toggle(&mut self, facet: &str, option: OptionId, modifier: bool) -> Result<EngineUpdate, EngineError> {
        let update = self.filter_mut(facet)?.toggle(option, modifier)?;
        Ok(self.emit(update.into()))
    }

    pub fn update(&mut self, facet: &str, actions: FilterActions) -> Result<EngineUpdate, EngineError> {
        let update = self.filter_mut(facet)?.update(actions)?;
        Ok(self.emit(update.into()))
    }

    /// Reset button of one facet.
    pub fn deactivate_facet(&mut self, facet: &str) -> Result<EngineUpdate, EngineError> {
        let update = self.filter_mut(facet)?.deactivate_all();
        let update = update.map(EngineUpdate::from).unwrap_or_else(|| EngineUpdate::empty(UpdateOrigin::User));
        Ok(self.emit(update))
    }

    pub fn expand(&mut self, facet: &str, option: OptionId) -> Result<(), EngineError> {
        self.filter_mut(facet)?.expand(option)
    }

    pub fn collapse(&mut self, facet: &str, option: OptionId, force: bool) -> Result<Option<EngineUpdate>, EngineError> {
        let update = self.filter_mut(facet)?.collapse(option, force)?;
        Ok(update.map(|u| self.emit(u.into())))
    }

    pub fn show_more(&mut self, facet: &str) -> Result<(), EngineError> {
        self.filter_mut(facet)?.show_more();
        Ok(())
    }

    /// Option list fetches requested since the last call.
    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        self.filters.iter_mut().flat_map(FacetFilter::take_fetches).collect()
    }

    /// Routes a fetch response to its filter.
    pub fn on_options_loaded(
        &mut self,
        request: &FetchRequest,
        result: anyhow::Result<Vec<FacetValue>>,
    ) -> Option<EngineUpdate> {
        let Ok(filter) = self.filter_mut(&request.facet) else {
            debug!(facet = %request.facet, "options for unknown facet");
            return None;
        };
        let update = filter.on_options_loaded(request, result)?;
        Some(self.emit(update.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::facet_state::FacetChangeState;
    use common::history_state::FilterState;
    use common::query_generator::QueryTerms;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use crate::theme::NoopTheme;

    fn engine() -> FacetsEngine {
        let facets = vec![
            FacetConfig::new("collection", "Collection", "/facet/collection/0"),
            FacetConfig::new("year", "Year", "/facet/year/0"),
        ];
        let mut engine = FacetsEngine::new(facets, Rc::new(NoopTheme), FilterOptions::default());
        for request in engine.take_fetches() {
            let values = match request.facet.as_str() {
                "collection" => vec![FacetValue::new("Articles", "Articles", 3), FacetValue::new("Books", "Books", 8)],
                _ => vec![FacetValue::new("2002", "2002", 12), FacetValue::new("2000", "2000", 3)],
            };
            engine.on_options_loaded(&request, Ok(values));
        }
        engine
    }

    fn id(engine: &FacetsEngine, facet: &str, value: &str) -> OptionId {
        engine.filter(facet).and_then(|f| f.tree().find(None, value)).unwrap()
    }

    #[test]
    fn test_query_structure_is_flat() {
        let mut engine = engine();
        let books = id(&engine, "collection", "Books");
        let y2000 = id(&engine, "year", "2000");
        engine.activate("collection", books, Sign::Include).unwrap();
        engine.activate("year", y2000, Sign::Exclude).unwrap();
        assert_eq!(
            engine.get_query_structure(),
            BTreeMap::from([
                ("collection".to_string(), QueryTerms::new(vec!["Books".into()], vec![])),
                ("year".to_string(), QueryTerms::new(vec![], vec!["2000".into()])),
            ])
        );
    }

    #[test]
    fn test_load_state_deactivates_absent_facets() {
        let mut engine = engine();
        let books = id(&engine, "collection", "Books");
        engine.activate("collection", books, Sign::Include).unwrap();

        let saved = BTreeMap::from([(
            "year".to_string(),
            BTreeMap::from([("year".to_string(), FilterState::new(vec!["2002".into()], vec![]))]),
        )]);
        let update = engine.load_state(&saved);
        assert_eq!(update.origin, UpdateOrigin::Restore);
        assert_eq!(
            update.changes,
            vec![
                FacetChange { name: "collection".into(), value: "Books".into(), state: FacetChangeState::Default },
                FacetChange { name: "year".into(), value: "2002".into(), state: FacetChangeState::Include },
            ]
        );
        assert_eq!(engine.get_state(), saved);
    }

    #[test]
    fn test_listeners_see_returned_update() {
        let mut engine = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.on_updated(move |update| sink.borrow_mut().push(update.clone()));

        let y2002 = id(&engine, "year", "2002");
        let update = engine.toggle("year", y2002, false).unwrap();
        let reset = engine.deactivate_facet("collection").unwrap();
        assert!(reset.changes.is_empty());
        assert_eq!(*seen.borrow(), vec![update, reset]);
    }

    #[test]
    fn test_unknown_facet() {
        let mut engine = engine();
        assert_eq!(engine.show_more("author"), Err(EngineError::UnknownFacet("author".into())));
    }
}
