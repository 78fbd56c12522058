use std::convert::Infallible;
use std::rc::Rc;

use common::facet_value::FacetConfig;
use common::facets_filter::FacetsFilter;
use common::history_state::HistoryState;
use common::query_generator::merge_queries;
use dioxus::prelude::*;
use facets_engine::{InitialPage, PopState, SearchPage as FacetsSearchPage, SearchPageConfig};

use crate::api::search_api::list_facets;
use crate::components::error_boundary::{FailedPart, SearchFailure};
use crate::components::search_components::{facet_panel::FacetPanel, results_pane::ResultsPane, search_form::SearchForm};
use crate::components::suspend_boundary::{Pending, SearchSuspense};
use crate::data_definitions::page_host::{PageContext, PageTheme, run_page_effects};
use crate::data_definitions::history_segment::HistorySegment;
use crate::routes::Route;

fn title_ellipsis(title: String) -> String {
    if title.chars().count() > 40 {
        title.chars().take(38).collect::<String>() + "..."
    } else {
        title
    }
}

#[component]
pub fn SearchPage(state: HistorySegment) -> Element {
    rsx! {
        Title { "Search: {title_ellipsis(state.user_query().to_string())}" }
    }
}

#[component]
pub fn SearchQueryPage(p: String, post_filter: String) -> Element {
    rsx! {
        Title { "Search: {title_ellipsis(p.clone())}" }
    }
}

/// Route state as the search page sees it: the history entry, if any, and
/// the user query of the location.
fn route_state(route: &Route) -> (Option<HistoryState>, String) {
    match route {
        Route::SearchPage { state } => (Some(state.state().clone()), state.user_query().to_string()),
        // a compiled fragment in the url joins the user query
        Route::SearchQueryPage { p, post_filter } => (None, merge_queries(p, post_filter)),
        Route::HomePage {} => (None, String::new()),
    }
}

#[component]
pub fn SearchLayout() -> Element {
    let route = use_route::<Route>();
    let (history, user_query) = route_state(&route);
    let location = route.to_string();

    rsx! {
        Outlet::<Route> {}
        SearchSuspense {
            pending: Pending::Facets,
            SearchPageRoot { history, user_query, location }
        }
    }
}

#[component]
fn SearchPageRoot(
    history: ReadSignal<Option<HistoryState>>,
    user_query: ReadSignal<String>,
    location: ReadSignal<String>,
) -> Element {
    let facets = use_resource(list_facets).suspend()?.cloned();
    let facets = match facets {
        Err(e) => return rsx! { SearchFailure { part: FailedPart::Facets, detail: e.to_string() } },
        Ok(facets) => facets,
    };
    rsx! {
        SearchPageView { facets, history, user_query, location }
    }
}

#[component]
fn SearchPageView(
    facets: Vec<FacetConfig>,
    history: ReadSignal<Option<HistoryState>>,
    user_query: ReadSignal<String>,
    location: ReadSignal<String>,
) -> Element {
    let notices = use_signal(Vec::new);
    let page = use_signal(|| None::<FacetsSearchPage>);
    let search_field = use_signal(|| user_query.peek().clone());
    let facets_field = use_signal(String::new);
    let ctx = use_context_provider(|| PageContext { page, search_field, facets_field, theme: PageTheme { notices } });

    use_hook(move || {
        let initial = InitialPage {
            user_query: user_query.peek().clone(),
            facets_filter: FacetsFilter::new(),
            history: history.peek().clone(),
            has_results_container: true,
        };
        let (new_page, effects) = FacetsSearchPage::init(SearchPageConfig::default(), facets, Rc::new(ctx.theme), initial);
        let mut page = ctx.page;
        page.set(Some(new_page));
        run_page_effects(ctx, effects);
    });

    // route changes the page did not push itself are back/forward navigations
    use_effect(move || {
        let state = history.read().clone();
        let route_query = user_query.read().clone();
        let url = location.read().clone();
        let in_sync = ctx.page.peek().as_ref().is_some_and(|p| match &state {
            Some(state) => p.facets_filter() == &state.facets_filter && p.user_query() == state.user_query,
            None => p.facets_filter().is_empty() && p.user_query() == route_query,
        });
        if in_sync {
            return;
        }
        let visible_user_query = ctx.search_field.peek().clone();
        ctx.dispatch(move |p| {
            Ok::<_, Infallible>(p.pop_state(PopState { url, state, visible_user_query, has_results_container: true }))
        });
    });

    rsx! {
        div {
            id: "x-search-page-root-component",
            style: r#"
                height: 100%;
                width: 100%;
                display: flex;
                flex-direction: column;
            "#,
            div {
                id: "x-search-form-top-bar",
                style: "
                    border-bottom: 1px solid rgb(164, 164, 164);
                    background-color: #F8FCFF;
                    flex-shrink: 0;
                    display: flex;
                    flex-direction: row;
                    align-items: center;
                    min-height: 76px;
                    width: 100%;
                ",
                SearchForm {}
            }
            div {
                id: "x-search-results-bottom-space",
                style: r#"
                    width: 100%;
                    display: flex;
                    flex-direction: row;
                    flex-grow: 1;
                    max-height: calc(100% - 76px);
                "#,
                div {
                    id: "x-search-facets-left-panel",
                    style: "
                        height: 100%;
                        background-color: #ECEEF2;
                        min-width: 280px;
                        width: 30%;
                        overflow-y: auto;
                    ",
                    FacetPanel {}
                }
                div {
                    id: "x-search-results-right-panel",
                    style: "
                        height: 100%;
                        flex-grow: 1;
                        overflow-y: auto;
                    ",
                    ResultsPane {}
                }
            }
        }
    }
}
