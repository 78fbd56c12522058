//! Facet option list endpoint.

mod fetch_facet_options;
pub use fetch_facet_options::fetch_facet_options;

mod list_facets;
pub use list_facets::list_facets;
