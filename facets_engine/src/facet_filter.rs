//! One facet: its option tree, loading and state save/restore.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use common::facet_state::{ActivationState, FacetChange, FacetChangeState, Sign};
use common::facet_value::{FacetConfig, FacetValue};
use common::history_state::{FilterState, FilterStateMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::option_tree::{Expansion, FacetOption, OptionId, OptionTree, TreeContext};
use crate::theme::FacetTheme;

/// Who caused a state change: the user, or the replay of a saved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOrigin {
    User,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    Loading,
    Loaded,
    /// The top level list could not be fetched. The facet stays empty for
    /// the rest of the session.
    Failed,
}

/// An option list fetch the host has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub facet: String,
    pub url: String,
    /// `None` for the top level list.
    pub parent: Option<OptionId>,
    /// Sent as `?parent=<value-id>`.
    pub parent_value: Option<String>,
    pub generation: u64,
    pub origin: UpdateOrigin,
}

/// Notification sent once per [`FacetFilter::update`] or state replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterUpdated {
    pub facet: String,
    pub origin: UpdateOrigin,
    pub changes: Vec<FacetChange>,
}

/// A batch of activations and deactivations applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterActions {
    pub to_add: Vec<(OptionId, Sign)>,
    pub to_delete: Vec<OptionId>,
}

impl FilterActions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add(mut self, option: OptionId, sign: Sign) -> Self {
        self.to_add.push((option, sign));
        self
    }
    pub fn delete(mut self, option: OptionId) -> Self {
        self.to_delete.push(option);
        self
    }
}

/// Settings shared by every filter of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub page_size: usize,
    pub exclusion_modifiers: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self { page_size: 5, exclusion_modifiers: true }
    }
}

/// Calls made before the top level options arrived, replayed afterwards.
#[derive(Debug, Clone)]
enum QueuedOp {
    LoadState(FilterStateMap),
    DeactivateAll,
}

/// A saved value waiting for one of its ancestors to be expanded.
#[derive(Debug, Clone)]
struct PendingRestore {
    value: String,
    sign: Sign,
    path: Vec<String>,
    waiting_on: OptionId,
}

pub struct FacetFilter {
    config: FacetConfig,
    theme: Rc<dyn FacetTheme>,
    tree: OptionTree,
    status: LoadStatus,
    visible_count: usize,
    page_size: usize,
    exclusion_modifiers: bool,
    generation: u64,
    /// Outstanding fetch generation per target (`None` = top level).
    in_flight: HashMap<Option<OptionId>, u64>,
    fetches: Vec<FetchRequest>,
    queued: Vec<QueuedOp>,
    restores: Vec<PendingRestore>,
    any_active: bool,
    listeners: Vec<Box<dyn FnMut(&FilterUpdated)>>,
}

impl std::fmt::Debug for FacetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetFilter")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("tree", &self.tree)
            .field("visible_count", &self.visible_count)
            .finish_non_exhaustive()
    }
}

impl FacetFilter {
    /// Creates the filter and requests its top level options.
    pub fn new(config: FacetConfig, theme: Rc<dyn FacetTheme>, options: FilterOptions) -> Self {
        let mut filter = Self {
            config,
            theme,
            tree: OptionTree::default(),
            status: LoadStatus::Loading,
            visible_count: options.page_size,
            page_size: options.page_size,
            exclusion_modifiers: options.exclusion_modifiers,
            generation: 0,
            in_flight: HashMap::new(),
            fetches: Vec::new(),
            queued: Vec::new(),
            restores: Vec::new(),
            any_active: false,
            listeners: Vec::new(),
        };
        filter.request(None, UpdateOrigin::Restore);
        filter
    }

    pub fn name(&self) -> &str {
        &self.config.facet
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn config(&self) -> &FacetConfig {
        &self.config
    }

    /// Key under which [`FacetFilter::get_state`] reports this filter.
    pub fn state_key(&self) -> &str {
        &self.config.facet
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn tree(&self) -> &OptionTree {
        &self.tree
    }

    pub fn option(&self, id: OptionId) -> Option<&FacetOption> {
        self.tree.get(id)
    }

    /// Whether any option of the facet is active or partially active.
    pub fn is_active(&self) -> bool {
        self.any_active
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count.min(self.tree.roots().len())
    }

    pub fn visible_roots(&self) -> &[OptionId] {
        &self.tree.roots()[..self.visible_count()]
    }

    pub fn has_more(&self) -> bool {
        self.visible_count() < self.tree.roots().len()
    }

    /// Shows one more page of top level options.
    pub fn show_more(&mut self) {
        self.visible_count = (self.visible_count + self.page_size).min(self.tree.roots().len());
    }

    /// Registers an observer called once per update of this filter.
    pub fn on_updated(&mut self, handler: impl FnMut(&FilterUpdated) + 'static) {
        self.listeners.push(Box::new(handler));
    }

    pub(crate) fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.fetches)
    }

    fn request(&mut self, target: Option<OptionId>, origin: UpdateOrigin) {
        self.generation += 1;
        self.in_flight.insert(target, self.generation);
        let parent_value = target.and_then(|id| self.tree.get(id)).map(|o| o.value_id().to_string());
        debug!(facet = %self.config.facet, ?parent_value, generation = self.generation, "requesting facet options");
        self.fetches.push(FetchRequest {
            facet: self.config.facet.clone(),
            url: self.config.url.clone(),
            parent: target,
            parent_value,
            generation: self.generation,
            origin,
        });
    }

    fn unknown(&self, option: OptionId) -> EngineError {
        EngineError::UnknownOption { facet: self.config.facet.clone(), option }
    }

    /// Applies deletions, then additions, then notifies exactly once.
    /// Fails without touching anything if an option is unknown.
    pub fn update(&mut self, actions: FilterActions) -> Result<FilterUpdated, EngineError> {
        let ids = actions.to_delete.iter().chain(actions.to_add.iter().map(|(id, _)| id));
        for id in ids {
            if !self.tree.contains(*id) {
                return Err(self.unknown(*id));
            }
        }
        let mut changes = self.cancel_restores(None);
        let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes: &mut changes };
        for id in actions.to_delete {
            self.tree.deactivate(id, &mut ctx);
        }
        for (id, sign) in actions.to_add {
            self.tree.activate(id, sign, &mut ctx);
        }
        Ok(self.finish(UpdateOrigin::User, changes))
    }

    /// Drops saved values still waiting for an ancestor, all of them or the
    /// ones waiting on `waiting_on`. They are reported as reset, so the
    /// facets filter of record forgets them as well.
    fn cancel_restores(&mut self, waiting_on: Option<OptionId>) -> Vec<FacetChange> {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.restores)
            .into_iter()
            .partition(|r| waiting_on.is_none_or(|id| r.waiting_on == id));
        self.restores = kept;
        dropped
            .into_iter()
            .map(|r| FacetChange { name: self.config.facet.clone(), value: r.value, state: FacetChangeState::Default })
            .collect()
    }

    pub fn activate(&mut self, option: OptionId, sign: Sign) -> Result<FilterUpdated, EngineError> {
        self.update(FilterActions::new().add(option, sign))
    }

    pub fn deactivate(&mut self, option: OptionId) -> Result<FilterUpdated, EngineError> {
        self.update(FilterActions::new().delete(option))
    }

    /// Click on an option: an active option is deactivated, anything else is
    /// included, or excluded when `modifier` is held and allowed.
    pub fn toggle(&mut self, option: OptionId, modifier: bool) -> Result<FilterUpdated, EngineError> {
        let node = self.tree.get(option).ok_or_else(|| self.unknown(option))?;
        if node.is_active() {
            return self.deactivate(option);
        }
        let sign = if self.exclusion_modifiers && modifier { Sign::Exclude } else { Sign::Include };
        self.activate(option, sign)
    }

    /// Resets every option to inactive (the reset button).
    pub fn deactivate_all(&mut self) -> Option<FilterUpdated> {
        self.deactivate_all_with(UpdateOrigin::User)
    }

    pub(crate) fn deactivate_all_with(&mut self, origin: UpdateOrigin) -> Option<FilterUpdated> {
        match self.status {
            LoadStatus::Loading => {
                self.queued = vec![QueuedOp::DeactivateAll];
                None
            }
            LoadStatus::Failed => None,
            LoadStatus::Loaded => {
                let mut changes = match origin {
                    UpdateOrigin::User => self.cancel_restores(None),
                    UpdateOrigin::Restore => Vec::new(),
                };
                self.reset(&mut changes);
                Some(self.finish(origin, changes))
            }
        }
    }

    fn reset(&mut self, changes: &mut Vec<FacetChange>) {
        self.restores.clear();
        let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes };
        self.tree.reset_all(&mut ctx);
    }

    /// Shows the children of `option`, fetching them on first use.
    pub fn expand(&mut self, option: OptionId) -> Result<(), EngineError> {
        let node = self.tree.get(option).ok_or_else(|| self.unknown(option))?;
        if !node.is_expandable() {
            return Err(EngineError::NotExpandable { facet: self.config.facet.clone(), option });
        }
        let (expansion, children_loaded) = (node.expansion(), node.children_loaded());
        match expansion {
            Expansion::Expanded | Expansion::Loading => {}
            Expansion::Collapsed if children_loaded => {
                self.tree.set_expansion(option, Expansion::Expanded);
                if let Some(node) = self.tree.get(option) {
                    self.theme.on_expanded(&self.config.facet, node);
                }
            }
            Expansion::Collapsed => {
                self.tree.set_expansion(option, Expansion::Loading);
                if !self.in_flight.contains_key(&Some(option)) {
                    self.request(Some(option), UpdateOrigin::User);
                }
            }
        }
        Ok(())
    }

    /// Hides the children of `option`. With `force` they are dropped, so the
    /// next expansion fetches them again.
    pub fn collapse(&mut self, option: OptionId, force: bool) -> Result<Option<FilterUpdated>, EngineError> {
        let node = self.tree.get(option).ok_or_else(|| self.unknown(option))?;
        if !node.is_expandable() {
            return Ok(None);
        }
        self.tree.set_expansion(option, Expansion::Collapsed);
        if let Some(node) = self.tree.get(option) {
            self.theme.on_collapsed(&self.config.facet, node);
        }
        if !force {
            return Ok(None);
        }
        self.in_flight.remove(&Some(option));
        let mut changes = self.cancel_restores(Some(option));
        let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes: &mut changes };
        self.tree.discard_children(option, &mut ctx);
        Ok(Some(self.finish(UpdateOrigin::User, changes)))
    }

    /// State of the registered options, the highest active ones:
    /// `{state_key: {"+": [...], "-": [...], "paths": {...}}}`, or an empty
    /// map when nothing is active.
    pub fn get_state(&self) -> FilterStateMap {
        let mut state = FilterState::default();
        for node in self.tree.registered_options() {
            let id = node.value_id().to_string();
            match node.registered() {
                Some(Sign::Include) => state.terms.include.push(id.clone()),
                Some(Sign::Exclude) => state.terms.exclude.push(id.clone()),
                None => continue,
            }
            if !node.value().parent_path.is_empty() {
                state.paths.insert(id, node.value().parent_path.clone());
            }
        }
        if state.is_empty() {
            return BTreeMap::new();
        }
        BTreeMap::from([(self.state_key().to_string(), state)])
    }

    /// Replaces the current selection with `saved`.
    ///
    /// Values below unexpanded ancestors are activated once the ancestors
    /// along their recorded path have been fetched. A value whose path cannot
    /// be resolved is dropped; the others still load.
    pub fn load_state(&mut self, saved: &FilterStateMap) -> Option<FilterUpdated> {
        match self.status {
            LoadStatus::Loading => {
                self.queued = vec![QueuedOp::LoadState(saved.clone())];
                None
            }
            LoadStatus::Failed => None,
            LoadStatus::Loaded => {
                let mut changes = Vec::new();
                self.restore(saved, &mut changes);
                Some(self.finish(UpdateOrigin::Restore, changes))
            }
        }
    }

    fn restore(&mut self, saved: &FilterStateMap, changes: &mut Vec<FacetChange>) {
        self.reset(changes);
        let Some(state) = saved.get(self.state_key()) else {
            return;
        };
        let signed = state
            .terms
            .include
            .iter()
            .map(|v| (v, Sign::Include))
            .chain(state.terms.exclude.iter().map(|v| (v, Sign::Exclude)));
        for (value, sign) in signed {
            let path = state.path_of(value).to_vec();
            self.resolve(value.clone(), sign, path, changes);
        }
    }

    /// Walks `path` from the roots. Stops at the first ancestor whose
    /// children are not loaded yet, expands it and waits for its response.
    fn resolve(&mut self, value: String, sign: Sign, path: Vec<String>, changes: &mut Vec<FacetChange>) {
        let mut level = None;
        for index in 0..path.len() {
            let ancestor = path[index].as_str();
            let Some(id) = self.tree.find(level, ancestor) else {
                debug!(facet = %self.config.facet, %value, %ancestor, "saved path no longer resolves");
                return;
            };
            let Some(node) = self.tree.get(id) else { return };
            if node.children_loaded() {
                level = Some(id);
                continue;
            }
            if !node.is_expandable() {
                debug!(facet = %self.config.facet, %value, %ancestor, "saved ancestor is not expandable");
                return;
            }
            if !self.in_flight.contains_key(&Some(id)) {
                self.tree.set_expansion(id, Expansion::Loading);
                self.request(Some(id), UpdateOrigin::Restore);
            }
            self.restores.push(PendingRestore { value, sign, path, waiting_on: id });
            return;
        }
        match self.tree.find(level, &value) {
            Some(id) => {
                let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes };
                self.tree.activate(id, sign, &mut ctx);
            }
            None => debug!(facet = %self.config.facet, %value, "saved value no longer offered"),
        }
    }

    /// Feeds the response of a [`FetchRequest`] back. Responses to requests
    /// that were superseded or cancelled are dropped.
    pub fn on_options_loaded(
        &mut self,
        request: &FetchRequest,
        result: anyhow::Result<Vec<FacetValue>>,
    ) -> Option<FilterUpdated> {
        if self.in_flight.get(&request.parent) != Some(&request.generation) {
            debug!(facet = %self.config.facet, generation = request.generation, "dropping stale facet options");
            return None;
        }
        self.in_flight.remove(&request.parent);
        match request.parent {
            None => self.on_top_level_loaded(result),
            Some(parent) => self.on_children_loaded(parent, request.origin, result),
        }
    }

    fn on_top_level_loaded(&mut self, result: anyhow::Result<Vec<FacetValue>>) -> Option<FilterUpdated> {
        let values = match result {
            Ok(values) => values,
            Err(err) => {
                warn!(facet = %self.config.facet, "could not load facet options: {err:#}");
                self.status = LoadStatus::Failed;
                self.queued.clear();
                self.theme.on_filter_load_failed(&self.config.facet);
                return None;
            }
        };
        debug!(facet = %self.config.facet, count = values.len(), "facet options loaded");
        let mut changes = Vec::new();
        {
            let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes: &mut changes };
            self.tree.reset_all(&mut ctx);
            self.tree.set_roots(values, &mut ctx);
        }
        self.status = LoadStatus::Loaded;
        for op in std::mem::take(&mut self.queued) {
            match op {
                QueuedOp::LoadState(saved) => self.restore(&saved, &mut changes),
                QueuedOp::DeactivateAll => self.reset(&mut changes),
            }
        }
        if changes.is_empty() {
            return None;
        }
        Some(self.finish(UpdateOrigin::Restore, changes))
    }

    fn on_children_loaded(
        &mut self,
        parent: OptionId,
        origin: UpdateOrigin,
        result: anyhow::Result<Vec<FacetValue>>,
    ) -> Option<FilterUpdated> {
        if !self.tree.contains(parent) {
            return None;
        }
        let values = match result {
            Ok(values) => values,
            Err(err) => {
                warn!(facet = %self.config.facet, option = %parent, "could not load options: {err:#}");
                self.tree.set_expansion(parent, Expansion::Collapsed);
                if let Some(node) = self.tree.get(parent) {
                    self.theme.on_load_failed(&self.config.facet, node);
                }
                self.restores.retain(|r| r.waiting_on != parent);
                return None;
            }
        };
        let mut changes = Vec::new();
        {
            let mut ctx = TreeContext { facet: &self.config.facet, theme: self.theme.as_ref(), changes: &mut changes };
            self.tree.attach_children(parent, values, &mut ctx);
        }
        if self.tree.get(parent).is_some_and(|o| o.expansion() == Expansion::Loading) {
            self.tree.set_expansion(parent, Expansion::Expanded);
            if let Some(node) = self.tree.get(parent) {
                self.theme.on_expanded(&self.config.facet, node);
            }
        }
        let (waiting, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.restores).into_iter().partition(|r| r.waiting_on == parent);
        self.restores = rest;
        let origin = if waiting.is_empty() { origin } else { UpdateOrigin::Restore };
        for restore in waiting {
            self.resolve(restore.value, restore.sign, restore.path, &mut changes);
        }
        if changes.is_empty() {
            return None;
        }
        Some(self.finish(origin, changes))
    }

    /// Mirrors the reset button state and notifies observers.
    fn finish(&mut self, origin: UpdateOrigin, changes: Vec<FacetChange>) -> FilterUpdated {
        let active = self.tree.roots().iter().any(|id| {
            self.tree.get(*id).is_some_and(|o| o.state() != ActivationState::Inactive)
        });
        if active != self.any_active {
            self.any_active = active;
            if active {
                self.theme.on_filter_activated(&self.config.facet);
            } else {
                self.theme.on_filter_deactivated(&self.config.facet);
            }
        }
        let update = FilterUpdated { facet: self.config.facet.clone(), origin, changes };
        for listener in &mut self.listeners {
            listener(&update);
        }
        update
    }
}
