//! Key-value storage areas backing the cart and wishlist.
//!
//! A storage area is a small string-keyed map, the server-side stand-in for a
//! browser's local storage. [`CartStore`](super::CartStore) writes the whole
//! serialized collection under one key after every mutation and reads it back
//! once when a store is hydrated.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tower_sessions::Session;

use crate::models::session_keys;

/// Errors raised by a storage area.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A writer panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string-keyed area holding serialized collections.
///
/// All methods take `&self`; implementations use interior mutability.
pub trait StorageArea: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the area cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the area cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: StorageArea + ?Sized> StorageArea for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

// =============================================================================
// MemoryArea
// =============================================================================

/// In-memory storage area.
#[derive(Debug, Default)]
pub struct MemoryArea {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryArea {
    /// Create an empty area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an area pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let items = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// SessionArea
// =============================================================================

/// Storage area backed by the visitor's session.
///
/// Session access is async, so the area works on a snapshot: [`load`] copies
/// the cart and wishlist keys out of the session, writes land in the snapshot
/// and are remembered as dirty, and [`flush`] copies dirty keys back into the
/// session. The session layer persists them when the response is sent.
///
/// [`load`]: SessionArea::load
/// [`flush`]: SessionArea::flush
#[derive(Debug, Default)]
pub struct SessionArea {
    snapshot: MemoryArea,
    dirty: Mutex<BTreeSet<String>>,
}

impl SessionArea {
    /// Keys copied out of the session on load.
    pub const KEYS: [&'static str; 2] = [session_keys::CART_ITEMS, session_keys::WISHLIST_ITEMS];

    /// Snapshot the storage keys from `session`.
    ///
    /// Keys that cannot be read are treated as absent and logged.
    pub async fn load(session: &Session) -> Self {
        let mut entries = Vec::with_capacity(Self::KEYS.len());

        for key in Self::KEYS {
            match session.get::<String>(key).await {
                Ok(Some(value)) => entries.push((key, value)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to read storage key from session");
                }
            }
        }

        Self {
            snapshot: MemoryArea::with_entries(entries),
            dirty: Mutex::default(),
        }
    }

    /// Write dirty keys back to `session`.
    ///
    /// Failures are logged and otherwise ignored; the in-memory state the
    /// caller already holds stays authoritative for the current request.
    pub async fn flush(&self, session: &Session) {
        let dirty = match self.dirty.lock() {
            Ok(mut dirty) => std::mem::take(&mut *dirty),
            Err(_) => {
                tracing::warn!("Storage dirty set poisoned, skipping session flush");
                return;
            }
        };

        for key in dirty {
            let value = match self.snapshot.get_item(&key) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to read storage snapshot");
                    continue;
                }
            };

            if let Err(e) = session.insert(&key, value).await {
                tracing::warn!(key, error = %e, "Failed to write storage key to session");
            }
        }
    }

    /// Keys written since the last flush.
    #[must_use]
    pub fn dirty_keys(&self) -> Vec<String> {
        self.dirty
            .lock()
            .map(|dirty| dirty.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl StorageArea for SessionArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.snapshot.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.snapshot.set_item(key, value)?;
        self.dirty
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_memory_area_get_set() {
        let area = MemoryArea::new();
        assert_eq!(area.get_item("k").unwrap(), None);

        area.set_item("k", "v1").unwrap();
        area.set_item("k", "v2").unwrap();
        assert_eq!(area.get_item("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_memory_area_with_entries() {
        let area = MemoryArea::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(area.get_item("b").unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_session_area_round_trip() {
        let session = session();
        session
            .insert(session_keys::CART_ITEMS, "[]".to_string())
            .await
            .unwrap();

        let area = SessionArea::load(&session).await;
        assert_eq!(
            area.get_item(session_keys::CART_ITEMS).unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(area.get_item(session_keys::WISHLIST_ITEMS).unwrap(), None);
        assert!(area.dirty_keys().is_empty());

        area.set_item(session_keys::WISHLIST_ITEMS, "[1]").unwrap();
        assert_eq!(area.dirty_keys(), vec![session_keys::WISHLIST_ITEMS]);

        area.flush(&session).await;
        assert!(area.dirty_keys().is_empty());

        let stored: Option<String> = session.get(session_keys::WISHLIST_ITEMS).await.unwrap();
        assert_eq!(stored.as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_session_area_ignores_non_string_values() {
        let session = session();
        session
            .insert(session_keys::CART_ITEMS, 42_u32)
            .await
            .unwrap();

        let area = SessionArea::load(&session).await;
        assert_eq!(area.get_item(session_keys::CART_ITEMS).unwrap(), None);
    }
}
