//! Client side faceted search: the option tree of every facet, the engine
//! aggregating them, and the search page orchestrator keeping both in sync
//! with the query, the results and browser history.

pub mod config;
pub mod error;
pub mod theme;
pub mod option_tree;
pub mod facet_filter;
pub mod engine;
pub mod search_page;
pub mod driver;

pub use config::SearchPageConfig;
pub use driver::{MemoryHost, PageHost, run_effects};
pub use engine::{EngineUpdate, FacetsEngine};
pub use error::EngineError;
pub use facet_filter::{FacetFilter, FetchRequest, FilterActions, FilterUpdated, LoadStatus, UpdateOrigin};
pub use option_tree::{Expansion, FacetOption, OptionId};
pub use search_page::{InitialPage, PageEffect, PopState, ResultsView, SearchPage};
pub use theme::{FacetTheme, NoopTheme};
