//! Order of the drag-reorderable analytics cards.
//!
//! The visible cards are a user-chosen subset of all cards. Their order is a
//! permutation of that subset, survives selection changes, and is persisted
//! so it survives reloads.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::persist::{self, KeyValueStore};

/// Storage key of the persisted card order.
pub const CARD_ORDER_KEY: &str = "analytics_card_order";

/// Current envelope version of the persisted card order.
pub const CARD_ORDER_VERSION: u32 = 1;

/// Merge a previous order with a new selection.
///
/// Ids kept from `previous` stay in their previous relative order; ids new
/// to the selection follow in selection order. Duplicates are dropped.
pub fn reconcile(previous: &[String], selection: &[String]) -> Vec<String> {
    let selected: HashSet<&str> = selection.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(selection.len());

    for id in previous {
        if selected.contains(id.as_str()) && seen.insert(id.as_str()) {
            order.push(id.clone());
        }
    }
    for id in selection {
        if seen.insert(id.as_str()) {
            order.push(id.clone());
        }
    }
    order
}

/// Move `active` to the position currently held by `over`.
///
/// Removes at the old index and inserts at the new one (a stable list move,
/// not a swap). Returns `false` if nothing moved.
pub fn move_card(order: &mut Vec<String>, active: &str, over: &str) -> bool {
    if active == over {
        return false;
    }
    let (Some(from), Some(to)) = (
        order.iter().position(|id| id == active),
        order.iter().position(|id| id == over),
    ) else {
        return false;
    };
    let card = order.remove(from);
    order.insert(to, card);
    true
}

/// The current card order together with the selection it was reconciled
/// against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardOrder {
    order: Vec<String>,
}

impl CardOrder {
    /// Load the persisted order and reconcile it with `selection`. Missing,
    /// malformed, or unknown-version records read as an empty order.
    pub fn load(store: &dyn KeyValueStore, selection: &[String]) -> Self {
        let previous: Vec<String> =
            persist::load_versioned(store, CARD_ORDER_KEY, CARD_ORDER_VERSION).unwrap_or_default();
        Self {
            order: reconcile(&previous, selection),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), CoreError> {
        persist::save_versioned(store, CARD_ORDER_KEY, CARD_ORDER_VERSION, &self.order)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Apply a new selection. Returns whether the order changed.
    pub fn set_selection(&mut self, selection: &[String]) -> bool {
        let next = reconcile(&self.order, selection);
        if next == self.order {
            return false;
        }
        self.order = next;
        true
    }

    /// Handle the end of a drag. Returns whether the order changed.
    pub fn drag_end(&mut self, active: &str, over: Option<&str>) -> bool {
        match over {
            Some(over) => move_card(&mut self.order, active, over),
            None => false,
        }
    }

    /// True if the order is exactly a permutation of `selection`.
    pub fn is_permutation_of(&self, selection: &[String]) -> bool {
        let order: HashSet<&str> = self.order.iter().map(String::as_str).collect();
        let wanted: HashSet<&str> = selection.iter().map(String::as_str).collect();
        order.len() == self.order.len() && order == wanted
    }
}
