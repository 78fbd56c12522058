//! Glue between the search page state machine and the browser: signals the
//! components render from, and the host executing page effects.

use std::collections::HashMap;

use common::history_state::HistoryState;
use dioxus::logger::tracing::{info, warn};
use dioxus::prelude::*;
use facets_engine::driver::{self, PageHost};
use facets_engine::{FacetOption, FacetTheme, PageEffect, ResultsView, SearchPage, SearchPageConfig};

use crate::api::search_api::ServerFnSource;
use crate::routes::Route;

/// Theme hooks surfacing load failures as notices above the facets.
#[derive(Clone, Copy)]
pub struct PageTheme {
    pub notices: Signal<Vec<String>>,
}

impl FacetTheme for PageTheme {
    fn on_load_failed(&self, facet: &str, option: &FacetOption) {
        let mut notices = self.notices;
        notices.write().push(format!("Could not load the options of {} in {}.", option.label(), facet));
    }

    fn on_filter_load_failed(&self, facet: &str) {
        let mut notices = self.notices;
        notices.write().push(format!("Could not load the {facet} facet."));
    }
}

#[derive(Clone, Copy)]
pub struct PageContext {
    pub page: Signal<Option<SearchPage>>,
    /// The free text search field.
    pub search_field: Signal<String>,
    /// The hidden field holding the compiled facets query.
    pub facets_field: Signal<String>,
    pub theme: PageTheme,
}

impl PageContext {
    /// Runs `action` on the page and executes the effects it returns.
    pub fn dispatch<E: std::fmt::Display>(
        self,
        action: impl FnOnce(&mut SearchPage) -> Result<Vec<PageEffect>, E>,
    ) {
        let mut page = self.page;
        let effects = {
            let mut guard = page.write();
            let Some(page) = guard.as_mut() else { return };
            match action(page) {
                Ok(effects) => effects,
                Err(e) => {
                    warn!("search page action failed: {e}");
                    return;
                }
            }
        };
        run_page_effects(self, effects);
    }
}

struct BrowserHost {
    ctx: PageContext,
    config: SearchPageConfig,
}

impl PageHost for BrowserHost {
    fn update_search_form(&mut self, user_query: &str, facets_query: &str) {
        self.ctx.search_field.set(user_query.to_string());
        self.ctx.facets_field.set(facets_query.to_string());
    }

    fn push_history(&mut self, url: &str, state: &HistoryState) {
        info!("push history: {}", url);
        navigator().push(Route::search_page_from_state(state.clone()));
    }

    fn full_reload(&mut self, url: &str) {
        let target = reload_target(&self.config, url);
        info!("full reload: {}", target);
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().assign(&target) {
                warn!("reload failed: {:?}", e);
            }
        }
    }

    // results are rendered straight from the page signal
    fn results_changed(&mut self, _results: &ResultsView) {}
}

/// Maps the `<path>?<params>` urls of the page onto the query string route;
/// other urls are used as they are.
pub fn reload_target(config: &SearchPageConfig, url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    if path != config.path {
        return url.to_string();
    }
    let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes()).into_owned().collect();
    let param = |name: &str| params.get(name).cloned().unwrap_or_default();
    Route::SearchQueryPage {
        p: param(&config.user_query_param),
        post_filter: param(&config.facets_filter_query_param),
    }
    .to_string()
}

/// Executes page effects. Fetches run as tasks of the current scope; each
/// response goes back into the page and its follow-up effects run in turn.
pub fn run_page_effects(ctx: PageContext, effects: Vec<PageEffect>) {
    let Some(config) = ctx.page.peek().as_ref().map(|p| p.config().clone()) else {
        return;
    };
    let mut host = BrowserHost { ctx, config };
    for effect in effects {
        match effect {
            PageEffect::FetchOptions(request) => {
                spawn(async move {
                    let outcome = driver::fetch_options(&ServerFnSource, request).await;
                    apply_outcome(ctx, outcome);
                });
            }
            PageEffect::FetchResults(request) => {
                spawn(async move {
                    let outcome = driver::fetch_results(&ServerFnSource, request).await;
                    apply_outcome(ctx, outcome);
                });
            }
            PageEffect::UpdateSearchForm { user_query, facets_query } => {
                host.update_search_form(&user_query, &facets_query)
            }
            PageEffect::PushHistory { url, state } => host.push_history(&url, &state),
            PageEffect::FullReload { url } => {
                host.full_reload(&url);
                return;
            }
        }
    }
}

fn apply_outcome(ctx: PageContext, outcome: driver::FetchOutcome) {
    let mut page = ctx.page;
    let effects = {
        let mut guard = page.write();
        let Some(page) = guard.as_mut() else { return };
        let mut host = BrowserHost { ctx, config: page.config().clone() };
        driver::apply_outcome(page, &mut host, outcome)
    };
    run_page_effects(ctx, effects);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reload_target_maps_query_urls() {
        let config = SearchPageConfig::default();
        let target = reload_target(&config, "/search?p=ellis+AND+year%3A2002&post_filter=");
        assert_eq!(
            target.parse::<Route>().ok(),
            Some(Route::SearchQueryPage { p: "ellis AND year:2002".into(), post_filter: String::new() })
        );
        assert_eq!(reload_target(&config, "/search/abc"), "/search/abc");
    }
}
