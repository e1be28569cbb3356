//! The storefront context: one cart and one favorites store over a shared
//! storage backend.
//!
//! The host builds a single `Storefront` at startup and passes it to whatever
//! needs it. Nothing here is global.

use std::sync::Arc;

use log::{debug, info};

use crate::cart_store::CartStore;
use crate::config::{StorageBackend, StorefrontConfig};
use crate::error::StoreError;
use crate::favorites_store::FavoritesStore;
use crate::local_db_state::AppDbState;
use crate::storage::{MemoryStorage, SlotStorage};

pub struct Storefront {
    pub cart: CartStore,
    pub favorites: FavoritesStore,
    storage: Arc<dyn SlotStorage>,
    lmdb: Option<Arc<AppDbState>>,
}

impl Storefront {
    /// Opens the configured backend and hydrates both stores. Only backend
    /// setup can fail; unreadable slots just start empty.
    pub fn open(config: StorefrontConfig) -> Result<Self, StoreError> {
        if config.cart_slot == config.favorites_slot {
            return Err(StoreError::InvalidConfig(format!(
                "cart and favorites must use different slots, both are '{}'",
                config.cart_slot
            )));
        }

        let (storage, lmdb): (Arc<dyn SlotStorage>, Option<Arc<AppDbState>>) = match config.backend {
            StorageBackend::Lmdb => {
                let db = Arc::new(AppDbState::init_with_map_size(
                    config.db_name.clone(),
                    config.map_size,
                )?);
                let storage: Arc<dyn SlotStorage> = db.clone();
                (storage, Some(db))
            }
            StorageBackend::Memory => {
                let storage: Arc<dyn SlotStorage> = Arc::new(MemoryStorage::new());
                (storage, None)
            }
        };

        let storefront = Self::with_storage(storage, &config);
        info!(
            "Storefront ready: {} cart lines, {} favorites",
            storefront.cart.len(),
            storefront.favorites.len()
        );
        Ok(Self { lmdb, ..storefront })
    }

    /// Builds both stores on an existing backend.
    pub fn with_storage(storage: Arc<dyn SlotStorage>, config: &StorefrontConfig) -> Self {
        Self {
            cart: CartStore::open(Arc::clone(&storage), &config.cart_slot),
            favorites: FavoritesStore::open(Arc::clone(&storage), &config.favorites_slot),
            storage,
            lmdb: None,
        }
    }

    /// Empties both stores and deletes their slots from storage, so a later
    /// open starts from nothing.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.cart.clear();
        self.favorites.clear_all();
        self.flush();

        for slot in [self.cart.slot(), self.favorites.slot()] {
            if self.storage.remove_slot(slot)? {
                debug!("Slot '{slot}' removed");
            }
        }
        info!("Storefront reset");
        Ok(())
    }

    pub fn flush(&self) {
        self.cart.flush();
        self.favorites.flush();
    }

    /// Writes out pending snapshots, stops the writers and closes LMDB.
    pub fn close(self) -> Result<(), StoreError> {
        let Storefront {
            cart,
            favorites,
            lmdb,
            ..
        } = self;
        drop(cart);
        drop(favorites);
        if let Some(db) = lmdb {
            db.close_database()?;
        }
        info!("Storefront closed");
        Ok(())
    }
}
