//! State shared between the search page components.

pub mod page_host;
pub mod history_segment;
