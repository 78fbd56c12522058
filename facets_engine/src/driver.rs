//! Runs the effects of a [`SearchPage`] against real data sources.
//!
//! Everything happens on the current task: fetches are polled together in a
//! `FuturesUnordered` and each response is handed back to the page before
//! the next one, so page state is never touched concurrently.

use std::collections::VecDeque;

use common::data_source::{FacetOptionSource, ResultsRequest, ResultsSource};
use common::facet_value::FacetValue;
use common::history_state::HistoryState;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::debug;

use crate::facet_filter::FetchRequest;
use crate::search_page::{PageEffect, ResultsView, SearchPage};

/// The browser side of the page.
pub trait PageHost {
    fn update_search_form(&mut self, user_query: &str, facets_query: &str);
    fn push_history(&mut self, url: &str, state: &HistoryState);
    fn full_reload(&mut self, url: &str);
    fn results_changed(&mut self, results: &ResultsView);
    /// Some option list arrived; facet rows may need redrawing.
    fn options_changed(&mut self) {}
}

/// The answer to a fetch effect.
#[derive(Debug)]
pub enum FetchOutcome {
    Options(FetchRequest, anyhow::Result<Vec<FacetValue>>),
    Results(u64, anyhow::Result<String>),
}

pub async fn fetch_options(source: &dyn FacetOptionSource, request: FetchRequest) -> FetchOutcome {
    let result = source.fetch_options(&request.url, request.parent_value.as_deref()).await;
    FetchOutcome::Options(request, result)
}

pub async fn fetch_results(source: &dyn ResultsSource, request: ResultsRequest) -> FetchOutcome {
    let result = source.fetch_results(&request).await;
    FetchOutcome::Results(request.generation, result)
}

/// Feeds a fetch outcome back into the page, returning follow-up effects.
pub fn apply_outcome(page: &mut SearchPage, host: &mut dyn PageHost, outcome: FetchOutcome) -> Vec<PageEffect> {
    match outcome {
        FetchOutcome::Options(request, result) => {
            let effects = page.on_options_loaded(&request, result);
            host.options_changed();
            effects
        }
        FetchOutcome::Results(generation, result) => {
            if page.on_results_loaded(generation, result) {
                host.results_changed(page.results());
            }
            Vec::new()
        }
    }
}

/// Executes `effects` and everything they lead to until no fetch is left.
/// A full reload ends the run; pending responses are dropped with the page.
pub async fn run_effects(
    page: &mut SearchPage,
    host: &mut dyn PageHost,
    options: &dyn FacetOptionSource,
    results: &dyn ResultsSource,
    effects: Vec<PageEffect>,
) {
    let mut queue: VecDeque<PageEffect> = effects.into();
    let mut pending: FuturesUnordered<LocalBoxFuture<'_, FetchOutcome>> = FuturesUnordered::new();
    loop {
        while let Some(effect) = queue.pop_front() {
            match effect {
                PageEffect::FetchOptions(request) => pending.push(fetch_options(options, request).boxed_local()),
                PageEffect::UpdateSearchForm { user_query, facets_query } => {
                    host.update_search_form(&user_query, &facets_query)
                }
                PageEffect::PushHistory { url, state } => host.push_history(&url, &state),
                PageEffect::FetchResults(request) => {
                    host.results_changed(page.results());
                    pending.push(fetch_results(results, request).boxed_local());
                }
                PageEffect::FullReload { url } => {
                    debug!(%url, pending = pending.len(), "full reload");
                    host.full_reload(&url);
                    return;
                }
            }
        }
        let Some(outcome) = pending.next().await else {
            break;
        };
        queue.extend(apply_outcome(page, host, outcome));
    }
}

/// Host keeping everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub user_query: String,
    pub facets_query: String,
    pub history: Vec<(String, HistoryState)>,
    pub reloads: Vec<String>,
    pub results: ResultsView,
    pub options_changes: usize,
}

impl PageHost for MemoryHost {
    fn update_search_form(&mut self, user_query: &str, facets_query: &str) {
        self.user_query = user_query.to_string();
        self.facets_query = facets_query.to_string();
    }

    fn push_history(&mut self, url: &str, state: &HistoryState) {
        self.history.push((url.to_string(), state.clone()));
    }

    fn full_reload(&mut self, url: &str) {
        self.reloads.push(url.to_string());
    }

    fn results_changed(&mut self, results: &ResultsView) {
        self.results = results.clone();
    }

    fn options_changed(&mut self) {
        self.options_changes += 1;
    }
}
