//! Drag-reorderable analytics card panel.

use std::sync::Arc;

use facility_core::card_order::CardOrder;
use facility_core::error::CoreError;
use facility_core::persist::KeyValueStore;

/// Card order bound to a store; every change is written through.
pub struct CardPanel {
    store: Arc<dyn KeyValueStore>,
    selection: Vec<String>,
    order: CardOrder,
}

impl CardPanel {
    /// Load the saved order and reconcile it with the cards the user has
    /// chosen to show.
    pub fn mount(store: Arc<dyn KeyValueStore>, selection: &[String]) -> Self {
        let order = CardOrder::load(store.as_ref(), selection);
        tracing::debug!(cards = order.ids().len(), "Card panel mounted");
        Self {
            store,
            selection: selection.to_vec(),
            order,
        }
    }

    pub fn ids(&self) -> &[String] {
        self.order.ids()
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Change which cards are shown. Kept cards stay in place, new ones go
    /// to the end.
    pub fn set_selection(&mut self, selection: &[String]) -> Result<bool, CoreError> {
        self.selection = selection.to_vec();
        let changed = self.order.set_selection(selection);
        if changed {
            self.order.save(self.store.as_ref())?;
        }
        Ok(changed)
    }

    /// Finish a drag of `active` over `over` (`None` when dropped outside).
    pub fn drag_end(&mut self, active: &str, over: Option<&str>) -> Result<bool, CoreError> {
        let moved = self.order.drag_end(active, over);
        if moved {
            tracing::debug!(card = active, over = over.unwrap_or_default(), "Card moved");
            self.order.save(self.store.as_ref())?;
        }
        Ok(moved)
    }
}
