use common::history_state::HistoryState;
use dioxus::prelude::*;

use crate::data_definitions::history_segment::HistorySegment;
use crate::pages::home_page::HomePage;
use crate::pages::search_page::{SearchLayout, SearchPage, SearchQueryPage};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    // the layout owns the search page state, so it survives navigation
    // between the routes below
    #[layout(SearchLayout)]

    #[route("/")]
    HomePage {},

    /// Entry point with a plain query string, e.g. after merging the facets
    /// into the user query.
    #[route("/search?:p&:post_filter")]
    SearchQueryPage { p: String, post_filter: String },

    /// History entries pushed by the search page, carrying their state.
    #[route("/search/:state")]
    SearchPage { state: HistorySegment },
}

impl Route {
    pub fn search_page_from_state(state: HistoryState) -> Self {
        Self::SearchPage { state: HistorySegment::from(state) }
    }
}
