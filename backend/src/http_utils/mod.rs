//! HTTP plumbing shared by the endpoint wrappers.

pub mod invenio_client;
pub mod response_cache;
