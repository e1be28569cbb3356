//! Key-value slot storage used by the stores.
//!
//! A slot is one named key holding a store's whole serialized collection.
//! Writes overwrite the previous content of the slot.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StoreError;

pub trait SlotStorage: Send + Sync {
    /// Returns `Ok(None)` when the slot has never been written.
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Returns whether the slot existed.
    fn remove_slot(&self, slot: &str) -> Result<bool, StoreError>;
}

/// Process-local storage. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl SlotStorage for MemoryStorage {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slots.read().get(slot).cloned())
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.slots.write().insert(slot.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove_slot(&self, slot: &str) -> Result<bool, StoreError> {
        Ok(self.slots.write().remove(slot).is_some())
    }
}
