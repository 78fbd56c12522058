use dioxus::prelude::*;
use facets_engine::ResultsView;

use crate::api::search_api::fetch_search_results;
use crate::components::error_boundary::{FailedPart, SearchFailure};
use crate::components::suspend_boundary::{LoadingIndicator, Pending, SearchSuspense};
use crate::data_definitions::page_host::PageContext;

/// The results container.
#[component]
pub fn ResultsPane() -> Element {
    let ctx = use_context::<PageContext>();
    let results = ctx.page.read().as_ref().map(|p| p.results().clone()).unwrap_or_default();

    match results {
        ResultsView::Initial => rsx! { SearchSuspense { pending: Pending::Results, InitialResults {} } },
        ResultsView::Loading => rsx! { LoadingIndicator { pending: Pending::Results } },
        ResultsView::Loaded(html) => rsx! {
            div { class: "x-results-partial", dangerous_inner_html: "{html}" }
        },
        ResultsView::Failed => rsx! {
            SearchFailure { part: FailedPart::Results }
        },
    }
}

/// Results for the query the page was opened with, rendered on the server.
#[component]
fn InitialResults() -> Element {
    let ctx = use_context::<PageContext>();
    let request = ctx.page.peek().as_ref().map(|p| p.results_request());
    let html = use_server_future(move || {
        let request = request.clone();
        async move {
            match request {
                Some(request) => fetch_search_results(request).await,
                None => Ok(String::new()),
            }
        }
    })?;
    let html = html.read().clone();
    match html {
        Some(Ok(html)) => rsx! { div { class: "x-results-partial", dangerous_inner_html: "{html}" } },
        Some(Err(e)) => rsx! { SearchFailure { part: FailedPart::Results, detail: e.to_string() } },
        None => rsx! { LoadingIndicator { pending: Pending::Results } },
    }
}
