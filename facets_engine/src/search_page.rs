//! The search page: keeps the facets engine, the facets filter of record,
//! the search form, browser history and the results pane consistent.
//!
//! [`SearchPage`] performs no I/O. Every method returns the effects the host
//! has to carry out, in order; fetch responses are fed back through
//! [`SearchPage::on_options_loaded`] and [`SearchPage::on_results_loaded`].

use std::rc::Rc;

use common::data_source::ResultsRequest;
use common::facet_state::Sign;
use common::facet_value::{FacetConfig, FacetValue};
use common::facets_filter::FacetsFilter;
use common::history_state::HistoryState;
use common::query_generator::{generate_query, merge_queries};
use tracing::{debug, info, warn};

use crate::config::SearchPageConfig;
use crate::engine::{EngineUpdate, FacetsEngine};
use crate::error::EngineError;
use crate::facet_filter::{FetchRequest, FilterActions, FilterOptions, UpdateOrigin};
use crate::option_tree::OptionId;
use crate::theme::FacetTheme;

/// What the server rendered and the browser knows when the page starts.
#[derive(Debug, Clone, Default)]
pub struct InitialPage {
    pub user_query: String,
    /// Facet selection the results were rendered with.
    pub facets_filter: FacetsFilter,
    /// State attached to the current history entry, if any.
    pub history: Option<HistoryState>,
    pub has_results_container: bool,
}

/// A browser back/forward navigation.
#[derive(Debug, Clone, Default)]
pub struct PopState {
    /// Location navigated to.
    pub url: String,
    pub state: Option<HistoryState>,
    /// Content of the search field as the browser restored it.
    pub visible_user_query: String,
    pub has_results_container: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultsView {
    /// Server rendered results, untouched.
    #[default]
    Initial,
    Loading,
    Loaded(String),
    /// "Could not update results".
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEffect {
    FetchOptions(FetchRequest),
    UpdateSearchForm { user_query: String, facets_query: String },
    PushHistory { url: String, state: HistoryState },
    FetchResults(ResultsRequest),
    FullReload { url: String },
}

pub struct SearchPage {
    config: SearchPageConfig,
    engine: FacetsEngine,
    facets_filter: FacetsFilter,
    user_query: String,
    results: ResultsView,
    results_generation: u64,
    has_results_container: bool,
}

impl std::fmt::Debug for SearchPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPage")
            .field("config", &self.config)
            .field("facets_filter", &self.facets_filter)
            .field("user_query", &self.user_query)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

impl SearchPage {
    /// Builds the engine for `facets` and brings it in line with the
    /// history entry, or with the server rendered filter when there is none.
    pub fn init(
        config: SearchPageConfig,
        facets: Vec<FacetConfig>,
        theme: Rc<dyn FacetTheme>,
        initial: InitialPage,
    ) -> (Self, Vec<PageEffect>) {
        let options = FilterOptions { page_size: config.page_size, exclusion_modifiers: config.exclusion_modifiers };
        let engine = FacetsEngine::new(facets, theme, options);
        let mut page = Self {
            config,
            engine,
            facets_filter: initial.facets_filter,
            user_query: initial.user_query,
            results: ResultsView::Initial,
            results_generation: 0,
            has_results_container: initial.has_results_container,
        };

        let mut effects = Vec::new();
        match initial.history {
            Some(history) => {
                info!(path = %history.path, "restoring search page from history");
                page.facets_filter = history.facets_filter.clone();
                page.user_query = history.user_query.clone();
                page.engine.load_state(&history.engine_state());
                effects.push(page.search_form_effect());
                effects.push(page.fetch_results_effect());
            }
            None => {
                page.engine.load_state(&page.facets_filter.to_engine_state());
            }
        }
        page.push_fetches(&mut effects);
        (page, effects)
    }

    pub fn config(&self) -> &SearchPageConfig {
        &self.config
    }

    pub fn engine(&self) -> &FacetsEngine {
        &self.engine
    }

    pub fn facets_filter(&self) -> &FacetsFilter {
        &self.facets_filter
    }

    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    pub fn results(&self) -> &ResultsView {
        &self.results
    }

    /// Compiled query fragment of the facets filter of record.
    pub fn facets_query(&self) -> String {
        generate_query(&self.facets_filter.to_query_data(), true)
    }

    /// `<path>?<user query param>=...&<facets param>=...`
    pub fn current_url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.config.user_query_param, &self.user_query)
            .append_pair(&self.config.facets_filter_query_param, &self.facets_query())
            .finish();
        format!("{}?{}", self.config.path, query)
    }

    pub fn history_state(&self) -> HistoryState {
        HistoryState {
            path: self.config.path.clone(),
            facets_filter: self.facets_filter.clone(),
            user_query: self.user_query.clone(),
            engine_state: Some(self.engine.get_state()),
        }
    }

    fn search_form_effect(&self) -> PageEffect {
        PageEffect::UpdateSearchForm { user_query: self.user_query.clone(), facets_query: self.facets_query() }
    }

    fn push_history_effect(&self) -> PageEffect {
        PageEffect::PushHistory { url: self.current_url(), state: self.history_state() }
    }

    /// Results request for the current query, tagged with the generation of
    /// the latest issued request.
    pub fn results_request(&self) -> ResultsRequest {
        ResultsRequest {
            generation: self.results_generation,
            path: self.config.path.clone(),
            user_query_param: self.config.user_query_param.clone(),
            user_query: self.user_query.clone(),
            facets_filter_query_param: self.config.facets_filter_query_param.clone(),
            facets_query: self.facets_query(),
        }
    }

    fn fetch_results_effect(&mut self) -> PageEffect {
        self.results_generation += 1;
        self.results = ResultsView::Loading;
        PageEffect::FetchResults(self.results_request())
    }

    fn push_fetches(&mut self, effects: &mut Vec<PageEffect>) {
        effects.extend(self.engine.take_fetches().into_iter().map(PageEffect::FetchOptions));
    }

    /// Records the facet changes of a user update and emits the
    /// form/history/results triple. Replays leave the record alone.
    fn on_engine_update(&mut self, update: Option<EngineUpdate>) -> Vec<PageEffect> {
        let mut effects = Vec::new();
        if let Some(update) = update
            && update.origin == UpdateOrigin::User
            && !update.changes.is_empty()
        {
            for change in &update.changes {
                self.facets_filter.set_facet_state(&change.name, &change.value, change.state);
            }
            debug!(changes = update.changes.len(), query = %self.facets_query(), "facets changed");
            effects.push(self.search_form_effect());
            effects.push(self.push_history_effect());
            effects.push(self.fetch_results_effect());
        }
        self.push_fetches(&mut effects);
        effects
    }

    pub fn toggle_option(&mut self, facet: &str, option: OptionId, modifier: bool) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.toggle(facet, option, modifier)?;
        Ok(self.on_engine_update(Some(update)))
    }

    pub fn activate_option(&mut self, facet: &str, option: OptionId, sign: Sign) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.activate(facet, option, sign)?;
        Ok(self.on_engine_update(Some(update)))
    }

    pub fn deactivate_option(&mut self, facet: &str, option: OptionId) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.deactivate(facet, option)?;
        Ok(self.on_engine_update(Some(update)))
    }

    pub fn update_options(&mut self, facet: &str, actions: FilterActions) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.update(facet, actions)?;
        Ok(self.on_engine_update(Some(update)))
    }

    /// Reset button of one facet.
    pub fn reset_facet(&mut self, facet: &str) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.deactivate_facet(facet)?;
        Ok(self.on_engine_update(Some(update)))
    }

    pub fn expand_option(&mut self, facet: &str, option: OptionId) -> Result<Vec<PageEffect>, EngineError> {
        self.engine.expand(facet, option)?;
        Ok(self.on_engine_update(None))
    }

    pub fn collapse_option(&mut self, facet: &str, option: OptionId, force: bool) -> Result<Vec<PageEffect>, EngineError> {
        let update = self.engine.collapse(facet, option, force)?;
        Ok(self.on_engine_update(update))
    }

    pub fn show_more(&mut self, facet: &str) -> Result<(), EngineError> {
        self.engine.show_more(facet)
    }

    /// The user typed into the search field.
    pub fn set_user_query(&mut self, text: impl Into<String>) {
        self.user_query = text.into();
    }

    /// The search form was submitted.
    pub fn submit_search(&mut self) -> Vec<PageEffect> {
        vec![self.push_history_effect(), self.fetch_results_effect()]
    }

    /// Moves the facet selection into the search field as query text and
    /// reloads the page, so the server renders facets for the merged query.
    pub fn edit_facets(&mut self) -> Vec<PageEffect> {
        self.user_query = merge_queries(&self.user_query, &self.facets_query());
        self.facets_filter.clear();
        info!(user_query = %self.user_query, "facets merged into the user query");
        let url = self.current_url();
        vec![self.search_form_effect(), self.push_history_effect(), PageEffect::FullReload { url }]
    }

    /// Browser back/forward. Falls back to a full reload whenever the stored
    /// state cannot be trusted.
    pub fn pop_state(&mut self, pop: PopState) -> Vec<PageEffect> {
        self.has_results_container = pop.has_results_container;
        let Some(state) = pop.state else {
            debug!(url = %pop.url, "no history state, reloading");
            return vec![PageEffect::FullReload { url: pop.url }];
        };
        if !self.has_results_container || state.user_query != pop.visible_user_query {
            debug!(url = %pop.url, "history state does not match the page, reloading");
            return vec![PageEffect::FullReload { url: pop.url }];
        }

        self.facets_filter = state.facets_filter.clone();
        self.user_query = state.user_query.clone();
        self.engine.load_state(&state.engine_state());
        let mut effects = vec![self.search_form_effect(), self.fetch_results_effect()];
        self.push_fetches(&mut effects);
        effects
    }

    pub fn on_options_loaded(&mut self, request: &FetchRequest, result: anyhow::Result<Vec<FacetValue>>) -> Vec<PageEffect> {
        let update = self.engine.on_options_loaded(request, result);
        self.on_engine_update(update)
    }

    /// Applies a results response. Returns `false` when a newer request has
    /// been issued in the meantime and the response was dropped.
    pub fn on_results_loaded(&mut self, generation: u64, result: anyhow::Result<String>) -> bool {
        if generation != self.results_generation {
            debug!(generation, current = self.results_generation, "dropping stale results");
            return false;
        }
        self.results = match result {
            Ok(html) => ResultsView::Loaded(html),
            Err(err) => {
                warn!("could not update results: {err:#}");
                ResultsView::Failed
            }
        };
        true
    }
}
