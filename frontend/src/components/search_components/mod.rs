//! Search page building blocks.

pub mod facet_panel;
pub mod results_pane;
pub mod search_form;
