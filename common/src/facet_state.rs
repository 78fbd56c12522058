//! Activation states of facet options and the signs used to persist them.

use serde::{Deserialize, Serialize};

/// State of a facet option.
///
/// `PartiallyActive` is only ever derived from the children of an expanded
/// option and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ActivationState {
    #[default]
    Inactive,
    Included,
    Excluded,
    PartiallyActive,
}

impl ActivationState {
    /// Included or excluded.
    pub fn is_active(self) -> bool {
        matches!(self, ActivationState::Included | ActivationState::Excluded)
    }

    pub fn sign(self) -> Option<Sign> {
        match self {
            ActivationState::Included => Some(Sign::Include),
            ActivationState::Excluded => Some(Sign::Exclude),
            _ => None,
        }
    }
}

/// Action applied to a facet value: `+` limits results to it, `-` excludes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Include,
    #[serde(rename = "-")]
    Exclude,
}

impl Sign {
    pub fn state(self) -> ActivationState {
        match self {
            Sign::Include => ActivationState::Included,
            Sign::Exclude => ActivationState::Excluded,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sign::Include => "+",
            Sign::Exclude => "-",
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a value carried by a facet change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetChangeState {
    Include,
    Exclude,
    Default,
}

impl From<Option<Sign>> for FacetChangeState {
    fn from(sign: Option<Sign>) -> Self {
        match sign {
            Some(Sign::Include) => FacetChangeState::Include,
            Some(Sign::Exclude) => FacetChangeState::Exclude,
            None => FacetChangeState::Default,
        }
    }
}

/// A value of a facet changed status: `{name, value, state}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetChange {
    pub name: String,
    pub value: String,
    pub state: FacetChangeState,
}
