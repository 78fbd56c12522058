//! Presentation hooks supplied by the page.
//!
//! The engine has no rendering logic of its own. It calls these hooks
//! whenever the display state of an option or a filter changes.

use crate::option_tree::FacetOption;

pub trait FacetTheme {
    fn on_activated(&self, _facet: &str, _option: &FacetOption) {}
    fn on_deactivated(&self, _facet: &str, _option: &FacetOption) {}
    fn on_partially_activated(&self, _facet: &str, _option: &FacetOption) {}
    fn on_expanded(&self, _facet: &str, _option: &FacetOption) {}
    fn on_collapsed(&self, _facet: &str, _option: &FacetOption) {}

    /// Called once for every option without children to expand, so the row
    /// can hide its expansion button.
    fn disable_expansion(&self, _facet: &str, _option: &FacetOption) {}

    /// The children of `option` could not be fetched.
    fn on_load_failed(&self, _facet: &str, _option: &FacetOption) {}

    /// Reset button state: some option of the facet became active.
    fn on_filter_activated(&self, _facet: &str) {}
    /// Reset button state: no option of the facet is active anymore.
    fn on_filter_deactivated(&self, _facet: &str) {}
    /// The top level options of the facet could not be fetched.
    fn on_filter_load_failed(&self, _facet: &str) {}

    /// Row template: `label (records)`.
    fn option_label(&self, option: &FacetOption) -> String {
        format!("{} ({})", option.label(), option.record_count())
    }
}

/// Theme which ignores every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTheme;

impl FacetTheme for NoopTheme {}
