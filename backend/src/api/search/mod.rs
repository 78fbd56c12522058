//! Search results endpoint.

mod fetch_search_results;
pub use fetch_search_results::fetch_search_results;
