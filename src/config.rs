//! Storefront configuration, passed by the host as JSON.

use serde::{Deserialize, Serialize};

use crate::cart_store::DEFAULT_CART_SLOT;
use crate::favorites_store::DEFAULT_FAVORITES_SLOT;
use crate::local_db_state::DEFAULT_MAP_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Lmdb,
    Memory,
}

/// Every field is optional in JSON and falls back to [`Default`].
///
/// ```rust
/// use storefront_core::config::{StorageBackend, StorefrontConfig};
///
/// let config = StorefrontConfig::from_json(r#"{"db_name": "shop", "backend": "memory"}"#)?;
/// assert_eq!(config.db_name, "shop");
/// assert_eq!(config.backend, StorageBackend::Memory);
/// assert_eq!(config.cart_slot, "user_cart");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// LMDB environment name. The data lives in `<db_name>.lmdb/`.
    pub db_name: String,
    pub backend: StorageBackend,
    pub cart_slot: String,
    pub favorites_slot: String,
    /// LMDB map size in bytes.
    pub map_size: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            db_name: "storefront".to_string(),
            backend: StorageBackend::Lmdb,
            cart_slot: DEFAULT_CART_SLOT.to_string(),
            favorites_slot: DEFAULT_FAVORITES_SLOT.to_string(),
            map_size: DEFAULT_MAP_SIZE,
        }
    }
}

impl StorefrontConfig {
    /// Parses a config. Blank input yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }

    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }
}
