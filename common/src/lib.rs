//! Common library exports shared between the facets engine, backend and frontend.

extern crate serde;

pub mod facet_value;
pub mod facet_state;
pub mod facets_filter;
pub mod query_generator;
pub mod history_state;
pub mod data_source;
