//! The favorites list: at most one entry per product id.

use std::sync::Arc;

use log::debug;

use crate::model::FavoriteEntry;
use crate::persistence::{PersistedList, PersistenceStats, StoreState};
use crate::storage::SlotStorage;

pub const DEFAULT_FAVORITES_SLOT: &str = "user_favorites";

pub struct FavoritesStore {
    entries: PersistedList<FavoriteEntry>,
}

impl FavoritesStore {
    pub fn open(storage: Arc<dyn SlotStorage>, slot: &str) -> Self {
        Self {
            entries: PersistedList::open(storage, slot, dedup_entries),
        }
    }

    /// Appends `entry` unless its id is already a favorite. Returns whether
    /// it was added. The collection is persisted either way.
    pub fn add_favorite(&mut self, entry: FavoriteEntry) -> bool {
        let entries = self.entries.items_mut();
        let added = !entries.iter().any(|existing| existing.id == entry.id);
        if added {
            entries.push(entry);
        } else {
            debug!("Favorite {} already present", entry.id);
        }
        self.entries.persist();
        added
    }

    pub fn remove_favorite(&mut self, id: &str) {
        self.entries.items_mut().retain(|entry| entry.id != id);
        self.entries.persist();
    }

    /// Adds the entry if absent, removes it if present. Returns whether the
    /// id is a favorite afterwards.
    pub fn toggle_favorite(&mut self, entry: FavoriteEntry) -> bool {
        if self.is_favorite(&entry.id) {
            self.remove_favorite(&entry.id);
            false
        } else {
            self.add_favorite(entry)
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.entries.position(id).is_some()
    }

    pub fn clear_all(&mut self) {
        self.entries.items_mut().clear();
        self.entries.persist();
    }

    pub fn find_by_id(&self, id: &str) -> Option<&FavoriteEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        self.entries.items()
    }

    pub fn len(&self) -> usize {
        self.entries.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.items().is_empty()
    }

    pub fn state(&self) -> StoreState {
        self.entries.state()
    }

    pub fn slot(&self) -> &str {
        self.entries.slot()
    }

    pub fn persistence_stats(&self) -> PersistenceStats {
        self.entries.stats()
    }

    pub fn flush(&self) {
        self.entries.flush();
    }
}

fn dedup_entries(raw: Vec<FavoriteEntry>) -> Vec<FavoriteEntry> {
    let mut entries: Vec<FavoriteEntry> = Vec::with_capacity(raw.len());
    for entry in raw {
        if !entries.iter().any(|existing| existing.id == entry.id) {
            entries.push(entry);
        }
    }
    entries
}
