use dioxus::prelude::*;

/// Empty search; the search layout renders the page itself.
#[component]
pub fn HomePage() -> Element {
    rsx! {
        Title { "Search" }
    }
}
