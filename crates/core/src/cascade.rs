//! Cascading dependent selectors as an explicit per-level state machine.
//!
//! A cascade is a chain of N >= 2 selectors where the options of level `i`
//! depend on the value chosen at level `i - 1` (building -> wing -> area ->
//! floor -> room, category -> subcategory).
//!
//! | Event                      | Level i                     | Levels j > i          |
//! |----------------------------|-----------------------------|-----------------------|
//! | mount                      | 0 -> Loading                | Disabled              |
//! | options loaded             | Loading -> Ready            | unchanged             |
//! | options failed             | Loading -> Disabled, empty  | unchanged             |
//! | select same value          | no-op                       | no-op                 |
//! | same value, child failed   | unchanged                   | i+1 -> Loading again  |
//! | select `Some(v)`           | selected = v                | i+1 Loading, rest Disabled |
//! | select `None`              | selected = None             | Disabled              |
//!
//! There is no automatic retry: after a failure the user re-selects the
//! parent, which re-enters `Loading` for the child.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::list_state::ApplyOutcome;
use crate::sequence::{RequestSequencer, RequestTicket};
use crate::types::EntityId;

/// Smallest meaningful cascade.
pub const MIN_LEVELS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    Disabled,
    Loading,
    Ready,
}

/// One choice in a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeOption {
    pub id: EntityId,
    pub label: String,
    /// Id of the option at the previous level this one belongs to.
    #[serde(default)]
    pub parent_id: Option<EntityId>,
}

impl CascadeOption {
    pub fn new(id: EntityId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            parent_id: None,
        }
    }

    pub fn child_of(id: EntityId, label: impl Into<String>, parent_id: EntityId) -> Self {
        Self {
            id,
            label: label.into(),
            parent_id: Some(parent_id),
        }
    }
}

/// Keep only the options belonging to `parent_id`.
///
/// Used when a child list is preloaded in full and narrowed locally, e.g.
/// subcategories filtered by `category_id`.
pub fn filter_children(all: &[CascadeOption], parent_id: EntityId) -> Vec<CascadeOption> {
    all.iter()
        .filter(|o| o.parent_id == Some(parent_id))
        .cloned()
        .collect()
}

/// A request for the options of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsRequest {
    pub level: usize,
    /// Selected value of the parent level; `None` for level 0.
    pub parent: Option<EntityId>,
    pub ticket: RequestTicket,
}

#[derive(Debug, Clone)]
struct Level {
    name: String,
    status: LevelStatus,
    options: Vec<CascadeOption>,
    selected: Option<EntityId>,
    pending: Option<RequestTicket>,
}

impl Level {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: LevelStatus::Disabled,
            options: Vec::new(),
            selected: None,
            pending: None,
        }
    }

    fn disable(&mut self) {
        self.status = LevelStatus::Disabled;
        self.options.clear();
        self.selected = None;
        self.pending = None;
    }
}

#[derive(Debug, Clone)]
pub struct CascadeState {
    levels: Vec<Level>,
    sequencer: RequestSequencer,
}

impl CascadeState {
    /// Create a cascade with the given level names, all `Disabled`.
    pub fn new(names: &[&str]) -> Result<Self, CoreError> {
        if names.len() < MIN_LEVELS {
            return Err(CoreError::Validation(format!(
                "A cascade needs at least {MIN_LEVELS} levels, got {}",
                names.len()
            )));
        }
        Ok(Self {
            levels: names.iter().map(|n| Level::new(n)).collect(),
            sequencer: RequestSequencer::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Reset every level and start loading the root options.
    pub fn mount(&mut self) -> OptionsRequest {
        for level in &mut self.levels {
            level.disable();
        }
        self.start_loading(0, None)
    }

    fn start_loading(&mut self, index: usize, parent: Option<EntityId>) -> OptionsRequest {
        let ticket = self.sequencer.issue();
        let level = &mut self.levels[index];
        level.status = LevelStatus::Loading;
        level.options.clear();
        level.selected = None;
        level.pending = Some(ticket);
        OptionsRequest {
            level: index,
            parent,
            ticket,
        }
    }

    fn level(&self, index: usize) -> Result<&Level, CoreError> {
        self.levels.get(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Cascade level {index} is out of range (0..{})",
                self.levels.len()
            ))
        })
    }

    /// Deliver options for a pending request. Responses for a request that
    /// has been superseded are dropped.
    pub fn options_loaded(
        &mut self,
        request: &OptionsRequest,
        options: Vec<CascadeOption>,
    ) -> ApplyOutcome {
        let Some(level) = self.levels.get_mut(request.level) else {
            return ApplyOutcome::Stale;
        };
        if level.pending != Some(request.ticket) {
            tracing::debug!(selector = %level.name, "Ignoring superseded cascade options");
            return ApplyOutcome::Stale;
        }
        level.pending = None;
        level.options = options;
        level.status = LevelStatus::Ready;
        ApplyOutcome::Applied
    }

    /// Report that an options request failed. The level falls back to
    /// `Disabled` with no options.
    pub fn options_failed(&mut self, request: &OptionsRequest) -> ApplyOutcome {
        let Some(level) = self.levels.get_mut(request.level) else {
            return ApplyOutcome::Stale;
        };
        if level.pending != Some(request.ticket) {
            return ApplyOutcome::Stale;
        }
        tracing::warn!(selector = %level.name, "Cascade options failed to load");
        level.disable();
        ApplyOutcome::Applied
    }

    /// Select `value` at `index`. Every deeper level is cleared; if a value
    /// was chosen and a next level exists, the returned request must be
    /// fulfilled to populate it.
    pub fn select(
        &mut self,
        index: usize,
        value: Option<EntityId>,
    ) -> Result<Option<OptionsRequest>, CoreError> {
        let level = self.level(index)?;
        // With a parent selected the child is only Disabled after a failed
        // load, so re-selecting the same value retries it.
        let child_failed = value.is_some()
            && self
                .levels
                .get(index + 1)
                .is_some_and(|child| child.status == LevelStatus::Disabled);
        if level.selected == value && !child_failed {
            return Ok(None);
        }
        if level.status != LevelStatus::Ready {
            return Err(CoreError::Validation(format!(
                "Cannot select '{}' before its options are loaded",
                level.name
            )));
        }
        if let Some(id) = value {
            if !level.options.iter().any(|o| o.id == id) {
                return Err(CoreError::Validation(format!(
                    "Value {id} is not an option for '{}'",
                    level.name
                )));
            }
        }

        self.levels[index].selected = value;
        for deeper in &mut self.levels[index + 1..] {
            deeper.disable();
        }

        match value {
            Some(id) if index + 1 < self.levels.len() => {
                Ok(Some(self.start_loading(index + 1, Some(id))))
            }
            _ => Ok(None),
        }
    }

    pub fn status(&self, index: usize) -> Option<LevelStatus> {
        self.levels.get(index).map(|l| l.status)
    }

    pub fn selected(&self, index: usize) -> Option<EntityId> {
        self.levels.get(index).and_then(|l| l.selected)
    }

    pub fn options(&self, index: usize) -> &[CascadeOption] {
        self.levels
            .get(index)
            .map(|l| l.options.as_slice())
            .unwrap_or_default()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.levels.get(index).map(|l| l.name.as_str())
    }

    /// Label of the selected option at `index`.
    pub fn selected_label(&self, index: usize) -> Option<&str> {
        let level = self.levels.get(index)?;
        let id = level.selected?;
        level
            .options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.label.as_str())
    }

    /// Selected value at every level, root first.
    pub fn selections(&self) -> Vec<Option<EntityId>> {
        self.levels.iter().map(|l| l.selected).collect()
    }

    /// The deepest selected value, if any.
    pub fn deepest_selection(&self) -> Option<(usize, EntityId)> {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, l)| l.selected.map(|id| (i, id)))
    }

    /// True if no level below an unselected level holds a value.
    pub fn is_consistent(&self) -> bool {
        let mut seen_none = false;
        for level in &self.levels {
            match level.selected {
                None => seen_none = true,
                Some(_) if seen_none => return false,
                Some(_) => {}
            }
        }
        true
    }
}
