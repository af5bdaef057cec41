//! Row selection for bulk actions on a list page.

use std::collections::BTreeSet;

use crate::types::EntityId;

/// Ids currently checked in a list view.
///
/// Only ids visible on the current page may be selected; the set is pruned
/// whenever a new page of rows arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<EntityId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck `id`. Ids not in `visible` are ignored. Returns
    /// whether the set changed.
    pub fn toggle(&mut self, id: EntityId, checked: bool, visible: &[EntityId]) -> bool {
        if !visible.contains(&id) {
            return false;
        }
        if checked {
            self.ids.insert(id)
        } else {
            self.ids.remove(&id)
        }
    }

    /// Check or uncheck every visible id. Ids selected elsewhere are not
    /// touched (there are none after a prune, but this keeps the operation
    /// local to the page).
    pub fn select_all(&mut self, checked: bool, visible: &[EntityId]) {
        for id in visible {
            if checked {
                self.ids.insert(*id);
            } else {
                self.ids.remove(id);
            }
        }
    }

    /// Drop ids that are not in `visible`. Returns the number removed.
    pub fn retain_visible(&mut self, visible: &[EntityId]) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id));
        before - self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when every visible id is selected and the page is not empty.
    pub fn all_selected(&self, visible: &[EntityId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.ids.iter().copied().collect()
    }
}
