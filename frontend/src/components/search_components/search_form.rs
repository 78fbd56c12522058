use std::convert::Infallible;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::md_action_icons::MdSearch;

use crate::data_definitions::page_host::PageContext;

/// Free text field, the compiled facets query, and the action to merge the
/// latter into the former.
#[component]
pub fn SearchForm() -> Element {
    let ctx = use_context::<PageContext>();
    let mut search_field = ctx.search_field;
    let facets_field = ctx.facets_field;

    let submit = move |_: ()| {
        ctx.dispatch(|p| Ok::<_, Infallible>(p.submit_search()));
    };
    let search_oninput = move |event: Event<FormData>| {
        let text = event.value();
        search_field.set(text.clone());
        let mut page = ctx.page;
        if let Some(page) = page.write().as_mut() {
            page.set_user_query(text);
        }
    };
    let search_onkeydown = move |event: Event<KeyboardData>| {
        if event.key() == Key::Enter {
            submit(());
        }
    };
    let edit_facets = move |_| {
        ctx.dispatch(|p| Ok::<_, Infallible>(p.edit_facets()));
    };

    rsx! {
        div {
            id: "x-search-form-search-box",
            style: "
                display:flex;
                align-items:center;
                gap: 16px;
                background-color: white;
                border-radius: 9999px;
                padding: 10px 14px;
                height: 44px;
                color: #111827;
                border: 1px solid rgba(101, 101, 101, 0.8);
                width: 500px;
                margin-left: 16px;
            ",
            button {
                style: "border: none; background: none; cursor: pointer;",
                onclick: move |_| submit(()),
                Icon { icon: MdSearch, style: "width: 20px; height: 20px; color: #6B7280;" }
            }
            input {
                r#type: "text",
                name: "p",
                placeholder: "Search",
                style: "
                    flex:1;
                    border: none;
                    outline: none;
                    background: transparent;
                    color: #111827;
                    font-size: 20px;
                    font-family: Roboto, sans-serif;
                ",
                value: "{search_field}",
                oninput: search_oninput,
                onkeydown: search_onkeydown,
            }
        }
        if !facets_field.read().is_empty() {
            div {
                id: "x-search-form-facets-query",
                style: "display: flex; align-items: center; gap: 8px; margin-left: 16px; font-family: monospace;",
                input { r#type: "hidden", name: "post_filter", value: "{facets_field}" }
                span { "{facets_field}" }
                button { onclick: edit_facets, "Edit as text" }
            }
        }
    }
}
