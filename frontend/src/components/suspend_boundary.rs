use dioxus::prelude::*;

use crate::components::error_boundary::{FailedPart, SearchErrorBoundary};

/// What the search page is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Facets,
    Options,
    Results,
}

impl Pending {
    pub fn message(self) -> &'static str {
        match self {
            Self::Facets => "Loading facets...",
            Self::Options => "Loading options...",
            Self::Results => "Loading results...",
        }
    }

    fn failed_part(self) -> FailedPart {
        match self {
            Self::Facets | Self::Options => FailedPart::Facets,
            Self::Results => FailedPart::Results,
        }
    }
}

/// Suspends on server data for one part of the page; errors stay in that part.
#[component]
pub fn SearchSuspense(pending: Pending, children: Element) -> Element {
    rsx! {
        SuspenseBoundary {
            fallback: move |_: SuspenseContext| rsx! {
                LoadingIndicator { pending }
            },
            SearchErrorBoundary {
                part: pending.failed_part(),
                {children}
            }
        }
    }
}

#[component]
pub fn LoadingIndicator(pending: Pending) -> Element {
    rsx! {
        div {
            class: "x-loading",
            style: "color: rgba(28, 33, 45, 0.7); padding: 6px 10px;",
            "{pending.message()}"
        }
    }
}
