//! Tree of facet options, stored as an arena.
//!
//! Nodes refer to their parent and children by [`OptionId`], so activation
//! can walk down to every descendant and changes can be propagated up to the
//! root in O(depth) without back-pointers.

use std::fmt::Display;

use common::facet_state::{ActivationState, FacetChange, Sign};
use common::facet_value::FacetValue;
use serde::{Deserialize, Serialize};

use crate::theme::FacetTheme;

/// Index of an option inside the tree of its facet. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub(crate) usize);

impl OptionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for OptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expansion {
    #[default]
    Collapsed,
    Loading,
    Expanded,
}

/// One selectable value plus its session state.
#[derive(Debug, Clone)]
pub struct FacetOption {
    id: OptionId,
    value: FacetValue,
    /// Inactive, included or excluded. Never partially active.
    explicit: ActivationState,
    /// What the row shows; partially active when the children are mixed.
    display: ActivationState,
    expansion: Expansion,
    children_loaded: bool,
    parent: Option<OptionId>,
    children: Vec<OptionId>,
    /// What this option pushed into the facets filter, if anything.
    registered: Option<Sign>,
}

impl FacetOption {
    pub fn id(&self) -> OptionId {
        self.id
    }
    pub fn value(&self) -> &FacetValue {
        &self.value
    }
    pub fn value_id(&self) -> &str {
        &self.value.id
    }
    pub fn label(&self) -> &str {
        &self.value.label
    }
    pub fn record_count(&self) -> u64 {
        self.value.records_num
    }
    pub fn is_expandable(&self) -> bool {
        self.value.is_expandable
    }
    /// Display state, including the derived partially active state.
    pub fn state(&self) -> ActivationState {
        self.display
    }
    pub fn explicit_state(&self) -> ActivationState {
        self.explicit
    }
    pub fn is_active(&self) -> bool {
        self.display.is_active()
    }
    pub fn expansion(&self) -> Expansion {
        self.expansion
    }
    pub fn is_expanded(&self) -> bool {
        self.expansion == Expansion::Expanded
    }
    pub fn children_loaded(&self) -> bool {
        self.children_loaded
    }
    pub fn has_children(&self) -> bool {
        self.children_loaded && !self.children.is_empty()
    }
    pub fn children(&self) -> &[OptionId] {
        &self.children
    }
    pub fn parent(&self) -> Option<OptionId> {
        self.parent
    }
    pub fn registered(&self) -> Option<Sign> {
        self.registered
    }
}

/// What tree mutations need from their filter: where to send hooks and
/// where to record facet value changes.
pub(crate) struct TreeContext<'a> {
    pub facet: &'a str,
    pub theme: &'a dyn FacetTheme,
    pub changes: &'a mut Vec<FacetChange>,
}

#[derive(Debug, Clone, Default)]
pub struct OptionTree {
    nodes: Vec<Option<FacetOption>>,
    roots: Vec<OptionId>,
}

impl OptionTree {
    pub fn get(&self, id: OptionId) -> Option<&FacetOption> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: OptionId) -> Option<&mut FacetOption> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: OptionId) -> bool {
        self.get(id).is_some()
    }

    pub fn roots(&self) -> &[OptionId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Live options in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &FacetOption> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    /// Finds the option with value `value_id` among the roots, or among the
    /// children of `parent`.
    pub fn find(&self, parent: Option<OptionId>, value_id: &str) -> Option<OptionId> {
        let level = match parent {
            None => self.roots.as_slice(),
            Some(parent) => self.get(parent).map(|p| p.children.as_slice()).unwrap_or(&[]),
        };
        level.iter().copied().find(|id| self.get(*id).is_some_and(|o| o.value_id() == value_id))
    }

    /// Value ids from the root down to `id`, inclusive.
    pub fn path(&self, id: OptionId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.get(id)) {
            path.push(node.value.id.clone());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Value ids of the ancestors of `id`.
    pub fn parent_path(&self, id: OptionId) -> Vec<String> {
        let mut path = self.path(id);
        path.pop();
        path
    }

    /// Options currently held by the facets filter, in tree order.
    pub fn registered_options(&self) -> Vec<&FacetOption> {
        let mut found = Vec::new();
        for root in &self.roots {
            for id in self.subtree(*root) {
                if let Some(node) = self.get(id).filter(|n| n.registered.is_some()) {
                    found.push(node);
                }
            }
        }
        found
    }

    /// `id` followed by its descendants, depth first.
    fn subtree(&self, id: OptionId) -> Vec<OptionId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else { continue };
            stack.extend(node.children.iter().rev().copied());
            found.push(current);
        }
        found
    }

    fn descendants(&self, id: OptionId) -> Vec<OptionId> {
        let mut found = Vec::new();
        let mut stack = self.get(id).map(|n| n.children.clone()).unwrap_or_default();
        while let Some(child) = stack.pop() {
            if let Some(node) = self.get(child) {
                stack.extend(node.children.iter().copied());
            }
            found.push(child);
        }
        found
    }

    fn create(&mut self, mut value: FacetValue, parent: Option<OptionId>) -> OptionId {
        let id = OptionId(self.nodes.len());
        value.parent_path = parent.map(|p| self.path(p)).unwrap_or_default();
        self.nodes.push(Some(FacetOption {
            id,
            value,
            explicit: ActivationState::Inactive,
            display: ActivationState::Inactive,
            expansion: Expansion::Collapsed,
            children_loaded: false,
            parent,
            children: Vec::new(),
            registered: None,
        }));
        id
    }

    /// Replaces the whole tree with fresh, inactive top level options.
    pub(crate) fn set_roots(&mut self, values: Vec<FacetValue>, ctx: &mut TreeContext<'_>) {
        self.nodes.clear();
        let roots: Vec<OptionId> = values.into_iter().map(|v| self.create(v, None)).collect();
        for id in &roots {
            self.notify_expandability(*id, ctx);
        }
        self.roots = roots;
    }

    fn notify_expandability(&self, id: OptionId, ctx: &mut TreeContext<'_>) {
        if let Some(node) = self.get(id) {
            if !node.is_expandable() {
                ctx.theme.disable_expansion(ctx.facet, node);
            }
        }
    }

    pub(crate) fn set_expansion(&mut self, id: OptionId, expansion: Expansion) {
        if let Some(node) = self.get_mut(id) {
            node.expansion = expansion;
        }
    }

    /// Creates the children of `parent`, seeded with the parent's explicit
    /// state. An active parent keeps its registration; the children only
    /// mirror it until one of them changes.
    pub(crate) fn attach_children(&mut self, parent: OptionId, values: Vec<FacetValue>, ctx: &mut TreeContext<'_>) {
        let Some(initial) = self.get(parent).map(|p| p.explicit.sign()) else {
            return;
        };
        let ids: Vec<OptionId> = values.into_iter().map(|v| self.create(v, Some(parent))).collect();
        if let Some(node) = self.get_mut(parent) {
            node.children = ids.clone();
            node.children_loaded = true;
        }
        for id in &ids {
            self.notify_expandability(*id, ctx);
        }
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.apply_state(id, initial, ctx);
        }
        self.recompute(parent, ctx);
        let top = self.propagate_up(parent, ctx);
        self.sync_registrations(top, ctx);
    }

    /// Drops every descendant of `id`, which becomes a leaf again. A
    /// uniformly active option keeps its state and registers itself; a mixed
    /// one is deactivated.
    pub(crate) fn discard_children(&mut self, id: OptionId, ctx: &mut TreeContext<'_>) {
        let descendants = self.descendants(id);
        for child in &descendants {
            self.register(*child, None, ctx);
        }
        for child in descendants {
            if let Some(slot) = self.nodes.get_mut(child.0) {
                *slot = None;
            }
        }
        let Some(node) = self.get_mut(id) else { return };
        node.children.clear();
        node.children_loaded = false;
        let state = node.display.sign().map(Sign::state).unwrap_or(ActivationState::Inactive);
        node.explicit = state;
        self.set_display(id, state, ctx);
        let top = self.propagate_up(id, ctx);
        self.sync_registrations(top, ctx);
    }

    pub(crate) fn activate(&mut self, id: OptionId, sign: Sign, ctx: &mut TreeContext<'_>) {
        self.apply_state(id, Some(sign), ctx);
        let top = self.propagate_up(id, ctx);
        self.sync_registrations(top, ctx);
    }

    pub(crate) fn deactivate(&mut self, id: OptionId, ctx: &mut TreeContext<'_>) {
        self.apply_state(id, None, ctx);
        let top = self.propagate_up(id, ctx);
        self.sync_registrations(top, ctx);
    }

    /// Deactivates every option.
    pub(crate) fn reset_all(&mut self, ctx: &mut TreeContext<'_>) {
        for root in self.roots.clone() {
            self.apply_state(root, None, ctx);
            self.sync_registrations(root, ctx);
        }
    }

    /// Sets the explicit state of `id` and of all its descendants.
    fn apply_state(&mut self, id: OptionId, sign: Option<Sign>, ctx: &mut TreeContext<'_>) {
        let state = sign.map(Sign::state).unwrap_or(ActivationState::Inactive);
        let children = {
            let Some(node) = self.get_mut(id) else { return };
            node.explicit = state;
            if node.has_children() { node.children.clone() } else { Vec::new() }
        };
        for child in children {
            self.apply_state(child, sign, ctx);
        }
        self.set_display(id, state, ctx);
    }

    /// What `id` should hold in the facets filter: its sign when it is
    /// active and its parent is not, nothing otherwise.
    fn wanted_registration(&self, id: OptionId) -> Option<Sign> {
        let node = self.get(id)?;
        let parent_active = node.parent.and_then(|p| self.get(p)).is_some_and(|p| p.display.is_active());
        if parent_active { None } else { node.display.sign() }
    }

    /// Brings the registrations below `top` in line with the display
    /// states: removals first, then additions.
    fn sync_registrations(&mut self, top: OptionId, ctx: &mut TreeContext<'_>) {
        let wanted: Vec<(OptionId, Option<Sign>)> =
            self.subtree(top).into_iter().map(|id| (id, self.wanted_registration(id))).collect();
        for (id, sign) in &wanted {
            if sign.is_none() {
                self.register(*id, None, ctx);
            }
        }
        for (id, sign) in wanted {
            if sign.is_some() {
                self.register(id, sign, ctx);
            }
        }
    }

    fn register(&mut self, id: OptionId, sign: Option<Sign>, ctx: &mut TreeContext<'_>) {
        let Some(node) = self.get_mut(id) else { return };
        if node.registered == sign {
            return;
        }
        node.registered = sign;
        ctx.changes.push(FacetChange {
            name: ctx.facet.to_string(),
            value: node.value.id.clone(),
            state: sign.into(),
        });
    }

    fn set_display(&mut self, id: OptionId, state: ActivationState, ctx: &mut TreeContext<'_>) {
        let Some(node) = self.get_mut(id) else { return };
        if node.display == state {
            return;
        }
        node.display = state;
        let node = &*node;
        match state {
            ActivationState::Included | ActivationState::Excluded => ctx.theme.on_activated(ctx.facet, node),
            ActivationState::Inactive => ctx.theme.on_deactivated(ctx.facet, node),
            ActivationState::PartiallyActive => ctx.theme.on_partially_activated(ctx.facet, node),
        }
    }

    /// Recomputes the ancestors of `id`, stopping at the first one whose
    /// display state does not change. Returns the highest option that
    /// changed, or `id`.
    fn propagate_up(&mut self, id: OptionId, ctx: &mut TreeContext<'_>) -> OptionId {
        let mut top = id;
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            let before = self.get(parent).map(|p| p.display);
            self.recompute(parent, ctx);
            let Some(node) = self.get(parent) else { break };
            if Some(node.display) == before {
                break;
            }
            top = parent;
            current = node.parent;
        }
        top
    }

    /// Children all in one state: the parent mirrors it. Mixed: partially active.
    fn recompute(&mut self, id: OptionId, ctx: &mut TreeContext<'_>) {
        let Some(node) = self.get(id) else { return };
        let states: Vec<ActivationState> =
            node.children.iter().filter_map(|c| self.get(*c)).map(|c| c.display).collect();
        let Some(first) = states.first().copied() else { return };
        let uniform = first != ActivationState::PartiallyActive && states.iter().all(|s| *s == first);
        let (explicit, display) = if uniform {
            (first, first)
        } else {
            (ActivationState::Inactive, ActivationState::PartiallyActive)
        };
        if let Some(node) = self.get_mut(id) {
            node.explicit = explicit;
        }
        self.set_display(id, display, ctx);
    }
}
