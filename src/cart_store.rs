//! The cart: one line per product id, each with a positive quantity.

use std::sync::Arc;

use log::debug;

use crate::model::{CartLine, NewCartLine};
use crate::persistence::{PersistedList, PersistenceStats, StoreState};
use crate::storage::SlotStorage;

pub const DEFAULT_CART_SLOT: &str = "user_cart";

pub struct CartStore {
    lines: PersistedList<CartLine>,
}

impl CartStore {
    /// Creates the store and hydrates it from `slot`. The store is `Ready`
    /// when this returns.
    pub fn open(storage: Arc<dyn SlotStorage>, slot: &str) -> Self {
        Self {
            lines: PersistedList::open(storage, slot, normalize_lines),
        }
    }

    /// Adds one unit of `item`: bumps the existing line or appends a new
    /// line with quantity 1.
    pub fn add_item(&mut self, item: NewCartLine) {
        let lines = self.lines.items_mut();
        match lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                debug!("Cart line {} now has quantity {}", line.id, line.quantity);
            }
            None => {
                debug!("Cart line {} added", item.id);
                lines.push(item.into_line(1));
            }
        }
        self.lines.persist();
    }

    /// Removes the line for `id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, id: &str) {
        self.lines.items_mut().retain(|line| line.id != id);
        self.lines.persist();
    }

    /// Sets the quantity of an existing line. Zero or negative removes it.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.items_mut().iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
        }
        self.lines.persist();
    }

    pub fn clear(&mut self) {
        self.lines.items_mut().clear();
        self.lines.persist();
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines
            .items()
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    pub fn total_price(&self) -> f64 {
        self.lines
            .items()
            .iter()
            .fold(0.0, |total, line| total + line.subtotal())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&CartLine> {
        self.lines.get(id)
    }

    pub fn lines(&self) -> &[CartLine] {
        self.lines.items()
    }

    pub fn len(&self) -> usize {
        self.lines.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.items().is_empty()
    }

    pub fn state(&self) -> StoreState {
        self.lines.state()
    }

    pub fn slot(&self) -> &str {
        self.lines.slot()
    }

    pub fn persistence_stats(&self) -> PersistenceStats {
        self.lines.stats()
    }

    /// Waits for all pending snapshots of this cart to reach storage.
    pub fn flush(&self) {
        self.lines.flush();
    }
}

/// Drops zero-quantity lines and merges duplicate ids, keeping the first
/// line's position and fields.
fn normalize_lines(raw: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(raw.len());
    for line in raw {
        if line.quantity == 0 {
            continue;
        }
        match lines.iter_mut().find(|existing| existing.id == line.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => lines.push(line),
        }
    }
    lines
}
