//! SettingsStore: durable persistence of the three settings keys.
//!
//! The store sits on top of any [`KeyValueStore`] backend and adds two
//! behaviours the backend knows nothing about:
//!
//! - **Seeding** – [`SettingsStore::ensure_seeded`] writes the default for
//!   every key that is missing.
//! - **Field-by-field fallback** – [`SettingsStore::read`] never fails.  Each
//!   key that is missing, empty, unreadable, or unparseable is replaced by its
//!   default independently, so a corrupt `port` does not cost us the stored
//!   `device_name`.
//!
//! Writes are the one place a storage error escapes, because the caller has to
//! know its change was not persisted.

use std::sync::Arc;

use async_trait::async_trait;
use nearsend_core::{parse_port, SettingKey, Settings};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors reported by a [`KeyValueStore`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store cannot be read or written at all.
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value is present but cannot be interpreted.
    #[error("stored value for `{key}` is corrupt: {reason}")]
    CorruptValue { key: String, reason: String },
}

/// A durable map from string keys to string values.
///
/// Backends must make a single `set` visible atomically; nothing is assumed
/// about consistency across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Seeds, reads, and writes [`Settings`] through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Writes the default value for every key that is absent.
    ///
    /// Returns `true` if at least one key was newly written.  A key whose
    /// presence cannot be checked, or whose default cannot be written, is
    /// logged and skipped; it does not count as seeded.
    pub async fn ensure_seeded(&self) -> bool {
        let mut seeded = false;

        for key in SettingKey::ALL {
            match self.backend.get(key.as_str()).await {
                Ok(Some(value)) if !value.is_empty() => continue,
                Ok(_) => {}
                Err(e) => {
                    warn!("cannot check `{key}` before seeding, leaving it untouched: {e}");
                    continue;
                }
            }

            let default = key.default_value();
            match self.backend.set(key.as_str(), &default).await {
                Ok(()) => {
                    info!("seeded `{key}` with default {default:?}");
                    seeded = true;
                }
                Err(e) => warn!("failed to seed `{key}`: {e}"),
            }
        }

        seeded
    }

    /// Reads all three settings, substituting defaults field by field.
    pub async fn read(&self) -> Settings {
        let defaults = Settings::default();

        let device_name = self
            .read_raw(SettingKey::DeviceName)
            .await
            .unwrap_or(defaults.device_name);

        let multicast_address = self
            .read_raw(SettingKey::MulticastAddress)
            .await
            .unwrap_or(defaults.multicast_address);

        let port = match self.read_raw(SettingKey::Port).await {
            Some(raw) => parse_port(&raw).unwrap_or_else(|| {
                warn!(
                    "stored `port` value {raw:?} is not a valid port, using default {}",
                    defaults.port
                );
                defaults.port
            }),
            None => defaults.port,
        };

        Settings {
            device_name,
            multicast_address,
            port,
        }
    }

    /// Persists every field of `settings`.
    ///
    /// All three keys are attempted even if one fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered.
    pub async fn write(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut first_error = None;

        for key in SettingKey::ALL {
            if let Err(e) = self.backend.set(key.as_str(), &settings.value_for(key)).await {
                warn!("failed to write `{key}`: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Returns the stored text for `key`, or `None` when the default should
    /// be used instead.
    async fn read_raw(&self, key: SettingKey) -> Option<String> {
        match self.backend.get(key.as_str()).await {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => {
                debug!("`{key}` is not set, using default");
                None
            }
            Err(e) => {
                warn!("failed to read `{key}`, using default: {e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::MemoryStore;

    fn make_store() -> (Arc<MemoryStore>, SettingsStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = SettingsStore::new(backend.clone());
        (backend, store)
    }

    // ── ensure_seeded ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_ensure_seeded_writes_all_defaults_on_empty_store() {
        // Arrange
        let (backend, store) = make_store();

        // Act
        let seeded = store.ensure_seeded().await;

        // Assert
        assert!(seeded);
        assert_eq!(backend.value("device_name").as_deref(), Some("Good Tomato"));
        assert_eq!(backend.value("multicast_address").as_deref(), Some("224.0.0.167"));
        assert_eq!(backend.value("port").as_deref(), Some("53317"));
    }

    #[tokio::test]
    async fn test_ensure_seeded_writes_only_the_absent_key() {
        for missing in SettingKey::ALL {
            // Arrange: every key present except `missing`.
            let (backend, store) = make_store();
            for key in SettingKey::ALL.into_iter().filter(|k| *k != missing) {
                backend.insert(key.as_str(), "custom");
            }
            let writes_before = backend.write_count();

            // Act
            let seeded = store.ensure_seeded().await;

            // Assert
            assert!(seeded, "missing {missing} must be seeded");
            assert_eq!(backend.write_count() - writes_before, 1, "only {missing} written");
            assert_eq!(backend.value(missing.as_str()), Some(missing.default_value()));
            for key in SettingKey::ALL.into_iter().filter(|k| *k != missing) {
                assert_eq!(backend.value(key.as_str()).as_deref(), Some("custom"));
            }
        }
    }

    #[tokio::test]
    async fn test_ensure_seeded_second_call_returns_false() {
        let (backend, store) = make_store();

        assert!(store.ensure_seeded().await);
        let writes_after_first = backend.write_count();

        assert!(!store.ensure_seeded().await);
        assert_eq!(backend.write_count(), writes_after_first, "no further writes");
    }

    #[tokio::test]
    async fn test_ensure_seeded_treats_empty_value_as_absent() {
        let (backend, store) = make_store();
        backend.insert("device_name", "");
        backend.insert("multicast_address", "239.0.0.1");
        backend.insert("port", "1234");

        assert!(store.ensure_seeded().await);
        assert_eq!(backend.value("device_name").as_deref(), Some("Good Tomato"));
    }

    #[tokio::test]
    async fn test_ensure_seeded_returns_false_when_storage_unavailable() {
        // Arrange
        let (backend, store) = make_store();
        backend.set_reads_unavailable(true);
        backend.set_writes_unavailable(true);

        // Act / Assert: no panic, nothing written, nothing reported as seeded.
        assert!(!store.ensure_seeded().await);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_seeded_does_not_overwrite_corrupt_value() {
        let (backend, store) = make_store();
        backend.insert("device_name", "Desk");
        backend.insert("multicast_address", "239.0.0.1");
        backend.mark_corrupt("port");

        assert!(!store.ensure_seeded().await);
        assert_eq!(backend.write_count(), 0);
    }

    // ── read ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_read_after_seeding_returns_defaults() {
        let (_backend, store) = make_store();
        store.ensure_seeded().await;

        assert_eq!(store.read().await, Settings::default());
    }

    #[tokio::test]
    async fn test_read_substitutes_default_for_non_numeric_port_only() {
        // Arrange
        let (backend, store) = make_store();
        backend.insert("device_name", "Living Room PC");
        backend.insert("multicast_address", "239.255.0.1");
        backend.insert("port", "abc");

        // Act
        let settings = store.read().await;

        // Assert
        assert_eq!(settings.device_name, "Living Room PC");
        assert_eq!(settings.multicast_address, "239.255.0.1");
        assert_eq!(settings.port, 53317);
    }

    #[tokio::test]
    async fn test_read_substitutes_default_for_corrupt_key_only() {
        let (backend, store) = make_store();
        backend.insert("device_name", "Desk");
        backend.insert("port", "8080");
        backend.mark_corrupt("multicast_address");

        let settings = store.read().await;

        assert_eq!(settings.device_name, "Desk");
        assert_eq!(settings.multicast_address, "224.0.0.167");
        assert_eq!(settings.port, 8080);
    }

    #[tokio::test]
    async fn test_read_returns_defaults_when_storage_unavailable() {
        let (backend, store) = make_store();
        backend.insert("device_name", "Desk");
        backend.set_reads_unavailable(true);

        assert_eq!(store.read().await, Settings::default());
    }

    #[tokio::test]
    async fn test_read_tolerates_partial_seed() {
        // Only the first key made it to disk before a restart.
        let (backend, store) = make_store();
        backend.insert("device_name", "Half Seeded");

        let settings = store.read().await;

        assert_eq!(settings.device_name, "Half Seeded");
        assert_eq!(settings.multicast_address, "224.0.0.167");
        assert_eq!(settings.port, 53317);
    }

    #[tokio::test]
    async fn test_read_rejects_out_of_range_port() {
        let (backend, store) = make_store();
        backend.insert("port", "70000");

        assert_eq!(store.read().await.port, 53317);
    }

    // ── write ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_write_then_read_observes_new_values() {
        let (_backend, store) = make_store();
        let updated = Settings {
            device_name: "Attic".to_string(),
            multicast_address: "239.1.1.1".to_string(),
            port: 40000,
        };

        store.write(&updated).await.expect("write");

        assert_eq!(store.read().await, updated);
    }

    #[tokio::test]
    async fn test_write_reports_unavailable_storage() {
        let (backend, store) = make_store();
        backend.set_writes_unavailable(true);

        let result = store.write(&Settings::default()).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
