//! What the search page shows when one of its parts cannot be produced.

use dioxus::prelude::*;

/// Part of the search page that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedPart {
    Page,
    Facets,
    Results,
}

impl FailedPart {
    pub fn message(self) -> &'static str {
        match self {
            Self::Page => "The search page could not be displayed.",
            Self::Facets => "The facets could not be loaded. The query still applies.",
            Self::Results => "Could not update results.",
        }
    }
}

/// Catches render errors below it. A failed page offers a fresh search, the
/// other parts can be retried in place.
#[component]
pub fn SearchErrorBoundary(part: FailedPart, children: Element) -> Element {
    rsx! {
        ErrorBoundary {
            handle_error: move |err: ErrorContext| {
                let detail = err.error().map(|e| format!("{:#?}", e.0)).unwrap_or_default();
                rsx! {
                    SearchFailure {
                        part,
                        detail,
                        if part == FailedPart::Page {
                            a {
                                href: "/",
                                style: "color:blue; border: 1px solid blue; padding: 6px 10px; border-radius: 5px;",
                                "New search"
                            }
                        } else {
                            button {
                                style: "color:blue; border: 1px solid blue; padding: 6px 10px; border-radius: 5px;",
                                onclick: move |_| err.clear_errors(),
                                "Retry"
                            }
                        }
                    }
                }
            },
            {children}
        }
    }
}

#[component]
pub fn SearchFailure(part: FailedPart, #[props(default)] detail: String, children: Element) -> Element {
    rsx! {
        div {
            class: "x-search-failure",
            style: "
                display: flex;
                flex-direction: column;
                align-items: center;
                gap: 8px;
                margin: 15px;
            ",
            p {
                style: "color:darkred; font-size: 20px; border: 1px solid red; padding: 10px; border-radius: 5px; margin: 0;",
                "{part.message()}"
            }
            if !detail.is_empty() {
                pre {
                    style: "color:black; padding: 10px; margin: 0; text-wrap: auto; max-width: 500px; max-height: 300px; overflow-y: auto;",
                    "{detail}"
                }
            }
            {children}
        }
    }
}

/// A notice above the facets, e.g. options of one value failed to load.
#[component]
pub fn FacetNotice(text: String) -> Element {
    rsx! {
        div {
            class: "x-facet-notice",
            style: "color: darkred; border: 1px solid red; border-radius: 5px; padding: 6px;",
            "{text}"
        }
    }
}
