//! The facet filters: one section per facet, each a tree of options.

use common::facet_state::ActivationState;
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::md_navigation_icons::{MdCancel, MdChevronRight, MdExpandMore};
use dioxus_free_icons::icons::md_toggle_icons::{MdCheckBox, MdCheckBoxOutlineBlank, MdIndeterminateCheckBox};
use facets_engine::{Expansion, FacetTheme, LoadStatus, OptionId};

use crate::components::error_boundary::FacetNotice;
use crate::components::suspend_boundary::{LoadingIndicator, Pending};
use crate::data_definitions::page_host::PageContext;

#[component]
pub fn FacetPanel() -> Element {
    let ctx = use_context::<PageContext>();
    let notices = ctx.theme.notices;
    let facets: Vec<String> = ctx
        .page
        .read()
        .as_ref()
        .map(|p| p.engine().filters().iter().map(|f| f.name().to_string()).collect())
        .unwrap_or_default();

    rsx! {
        div {
            id: "x-facet-panel",
            style: "
                display: flex;
                flex-direction: column;
                gap: 12px;
                padding: 12px;
            ",
            for notice in notices.read().iter() {
                FacetNotice { key: "{notice}", text: notice.clone() }
            }
            for facet in facets {
                FacetSection { key: "{facet}", facet: facet.clone() }
            }
        }
    }
}

#[component]
fn FacetSection(facet: ReadSignal<String>) -> Element {
    let ctx = use_context::<PageContext>();
    let page = ctx.page.read();
    let Some(filter) = page.as_ref().and_then(|p| p.engine().filter(&facet.read())) else {
        return rsx! {};
    };
    let title = filter.title().to_string();
    let status = filter.status();
    let roots = filter.visible_roots().to_vec();
    let has_more = filter.has_more();
    let is_active = filter.is_active();
    drop(page);

    let reset = move |_| {
        let facet = facet.read().clone();
        ctx.dispatch(move |p| p.reset_facet(&facet));
    };
    let show_more = move |_| {
        let facet = facet.read().clone();
        ctx.dispatch(move |p| p.show_more(&facet).map(|_| Vec::new()));
    };

    rsx! {
        div {
            class: "x-facet-section",
            style: "background: white; border-radius: 10px; padding: 10px; box-shadow: 0 0 10px 0 rgba(0, 0, 0, 0.1);",
            div {
                style: "display: flex; flex-direction: row; align-items: center; justify-content: space-between;",
                h3 { style: "margin: 4px 0;", "{title}" }
                button {
                    disabled: !is_active,
                    onclick: reset,
                    "Reset"
                }
            }
            if status == LoadStatus::Loading {
                LoadingIndicator { pending: Pending::Facets }
            } else if status == LoadStatus::Failed {
                div { style: "color: rgba(28, 33, 45, 0.7);", "Unavailable" }
            } else {
                for option in roots {
                    OptionRow { key: "{option}", facet: facet.read().clone(), option }
                }
                if has_more {
                    button { onclick: show_more, "Show more" }
                }
            }
        }
    }
}

fn state_class(state: ActivationState) -> &'static str {
    match state {
        ActivationState::Inactive => "inactive",
        ActivationState::Included => "included",
        ActivationState::Excluded => "excluded",
        ActivationState::PartiallyActive => "partiallyActive",
    }
}

/// One option and, when expanded, its children. Shift-click excludes.
#[component]
fn OptionRow(facet: ReadSignal<String>, option: OptionId) -> Element {
    let ctx = use_context::<PageContext>();
    let page = ctx.page.read();
    let Some(node) = page.as_ref().and_then(|p| p.engine().filter(&facet.read())).and_then(|f| f.option(option)) else {
        return rsx! {};
    };
    let label = ctx.theme.option_label(node);
    let state = node.state();
    let expandable = node.is_expandable();
    let expansion = node.expansion();
    let children = if node.is_expanded() { node.children().to_vec() } else { Vec::new() };
    drop(page);

    let toggle = move |e: Event<MouseData>| {
        let facet = facet.read().clone();
        let modifier = e.modifiers().contains(Modifiers::SHIFT);
        ctx.dispatch(move |p| p.toggle_option(&facet, option, modifier));
    };
    let expand_or_collapse = move |_| {
        let facet = facet.read().clone();
        if expansion == Expansion::Collapsed {
            ctx.dispatch(move |p| p.expand_option(&facet, option));
        } else {
            ctx.dispatch(move |p| p.collapse_option(&facet, option, false));
        }
    };

    rsx! {
        div {
            class: "x-facet-option {state_class(state)}",
            if expandable {
                button {
                    style: "border: none; background: none; cursor: pointer; padding: 0;",
                    onclick: expand_or_collapse,
                    if expansion == Expansion::Collapsed {
                        Icon { icon: MdChevronRight, style: "width: 20px; height: 20px;" }
                    } else {
                        Icon { icon: MdExpandMore, style: "width: 20px; height: 20px;" }
                    }
                }
            } else {
                span { style: "width: 20px; flex-shrink: 0;" }
            }
            div {
                style: "display: flex; flex-direction: row; align-items: center; gap: 6px;",
                onclick: toggle,
                if state == ActivationState::Included {
                    Icon { icon: MdCheckBox, style: "width: 20px; height: 20px; color: #1b4fd8;" }
                } else if state == ActivationState::Excluded {
                    Icon { icon: MdCancel, style: "width: 20px; height: 20px; color: #b42318;" }
                } else if state == ActivationState::PartiallyActive {
                    Icon { icon: MdIndeterminateCheckBox, style: "width: 20px; height: 20px;" }
                } else {
                    Icon { icon: MdCheckBoxOutlineBlank, style: "width: 20px; height: 20px;" }
                }
                span { class: "x-facet-label", "{label}" }
            }
        }
        if expansion == Expansion::Loading {
            div { class: "x-facet-children", LoadingIndicator { pending: Pending::Options } }
        }
        if !children.is_empty() {
            div {
                class: "x-facet-children",
                for child in children {
                    OptionRow { key: "{child}", facet: facet.read().clone(), option: child }
                }
            }
        }
    }
}
