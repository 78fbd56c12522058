use thiserror::Error;

use crate::option_tree::OptionId;

/// Misuse of the engine by its caller. Network failures never end up here,
/// they become UI state instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown facet: {0}")]
    UnknownFacet(String),

    #[error("unknown option {option} in facet {facet}")]
    UnknownOption { facet: String, option: OptionId },

    #[error("option {option} of facet {facet} is not expandable")]
    NotExpandable { facet: String, option: OptionId },
}
