//! Server side access to the Invenio facet and search endpoints.

pub mod api;
pub mod config;
pub mod http_utils;

pub use config::InvenioConfig;
pub use http_utils::invenio_client::InvenioClient;
