//! ConfigurationService: the single source of truth for settings.
//!
//! The service is the only component that writes settings.  Everything else
//! either asks it for a fresh copy ([`ConfigurationService::current_settings`])
//! or subscribes to change events.
//!
//! # Startup
//!
//! ```text
//! initialize()
//!  └─ ensure_seeded()        -- writes defaults for missing keys
//!      ├─ seeded  → read() → publish(settings)
//!      └─ already → (no event)
//! ```
//!
//! `initialize` cannot fail.  If storage is entirely unavailable every read
//! falls back to defaults and the failures are logged.

use nearsend_core::{DiscoveryParams, Settings};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::notifier::{SettingsNotifier, SettingsSubscription};
use super::settings_store::{SettingsStore, StoreError};

/// Owns settings persistence and change notification.
pub struct ConfigurationService {
    store: SettingsStore,
    notifier: SettingsNotifier,
    /// Serialises seed/update so events are published in write order.
    write_lock: Mutex<()>,
}

impl ConfigurationService {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            notifier: SettingsNotifier::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Registers a settings-changed subscriber.
    pub fn subscribe(&self) -> SettingsSubscription {
        self.notifier.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Seeds missing keys and announces the result if anything was seeded.
    pub async fn initialize(&self) {
        let _guard = self.write_lock.lock().await;

        if self.store.ensure_seeded().await {
            let settings = self.store.read().await;
            info!(
                "settings seeded: device_name={:?} multicast_address={} port={}",
                settings.device_name, settings.multicast_address, settings.port
            );
            self.notifier.publish(&settings);
        } else {
            info!("settings already present, nothing seeded");
        }
    }

    /// Returns the settings as currently persisted.
    ///
    /// Always goes to storage, so changes made outside this process are seen.
    pub async fn current_settings(&self) -> Settings {
        self.store.read().await
    }

    /// Persists `settings` and publishes the stored result.
    ///
    /// The value is written as given; range and format checks belong to the
    /// caller (see [`Settings::validate`]).  Nothing is published if the
    /// write fails.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from the first key that could not be written.
    pub async fn update_settings(&self, settings: Settings) -> Result<Settings, StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Err(e) = self.store.write(&settings).await {
            warn!("settings update not persisted: {e}");
            return Err(e);
        }

        let stored = self.store.read().await;
        self.notifier.publish(&stored);
        Ok(stored)
    }

    /// Discovery parameters derived from the current settings.
    pub async fn discovery_params(&self) -> DiscoveryParams {
        DiscoveryParams::from(&self.current_settings().await)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
