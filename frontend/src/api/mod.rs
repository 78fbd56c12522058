//! Server functions and the data sources built on them.

pub mod search_api;
