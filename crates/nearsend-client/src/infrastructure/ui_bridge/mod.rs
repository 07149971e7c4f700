//! UI command bridge: exposes application-layer operations to the frontend.
//!
//! Every command here takes the shared [`AppState`] and returns a
//! [`CommandResult`], so the frontend always gets the same shape back:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! The frontend surface is:
//!
//! | Command              | Returns             |
//! |----------------------|---------------------|
//! | `get_settings`       | `SettingsDto`       |
//! | `update_settings`    | `SettingsDto`       |
//! | `get_nearby_devices` | `DeviceRecord[]`    |
//! | `get_device_list`    | `DeviceRecord[]`    |
//!
//! Settings-changed events are not a command; a host that wants to push them
//! to the frontend subscribes through `state.config.subscribe()`.

use std::sync::Arc;

use nearsend_core::{DeviceRecord, Settings};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::{
    configuration::ConfigurationService,
    device_list::DeviceListController,
    discover_devices::{DiscoveryClient, DiscoveryEngine},
    settings_store::{KeyValueStore, SettingsStore},
};

// ── Shared application state ──────────────────────────────────────────────────

/// State shared by every command handler.
pub struct AppState {
    /// Owner of the persisted settings and their change notifications.
    pub config: Arc<ConfigurationService>,
    /// The device list shown on the send screen.
    pub device_list: Mutex<DeviceListController>,
}

impl AppState {
    /// Wires the services over the given storage backend and discovery engine.
    ///
    /// Does not touch storage; call `state.config.initialize()` once the
    /// subscribers that care about the first event are registered.
    pub fn new(store: Arc<dyn KeyValueStore>, engine: Arc<dyn DiscoveryEngine>) -> Arc<Self> {
        let config = Arc::new(ConfigurationService::new(SettingsStore::new(store)));
        let device_list = DeviceListController::new(DiscoveryClient::new(engine));

        Arc::new(Self {
            config,
            device_list: Mutex::new(device_list),
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Settings as exchanged with the frontend.
///
/// `port` is wider than `u16` so an out-of-range number typed into the form
/// is reported as a validation error instead of failing deserialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDto {
    pub device_name: String,
    pub multicast_address: String,
    pub port: u32,
}

impl From<Settings> for SettingsDto {
    fn from(s: Settings) -> Self {
        Self {
            device_name: s.device_name,
            multicast_address: s.multicast_address,
            port: u32::from(s.port),
        }
    }
}

impl TryFrom<SettingsDto> for Settings {
    type Error = String;

    fn try_from(dto: SettingsDto) -> Result<Self, Self::Error> {
        let port = u16::try_from(dto.port)
            .map_err(|_| format!("port {} is outside 1..=65535", dto.port))?;
        Ok(Self {
            device_name: dto.device_name,
            multicast_address: dto.multicast_address,
            port,
        })
    }
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the settings as currently persisted.
pub async fn get_settings(state: Arc<AppState>) -> CommandResult<SettingsDto> {
    CommandResult::ok(state.config.current_settings().await.into())
}

/// Validates, persists, and announces new settings from the settings form.
pub async fn update_settings(
    state: Arc<AppState>,
    settings: SettingsDto,
) -> CommandResult<SettingsDto> {
    let settings = match Settings::try_from(settings) {
        Ok(s) => s,
        Err(msg) => return CommandResult::err(msg),
    };
    if let Err(e) = settings.validate() {
        return CommandResult::err(e.to_string());
    }

    match state.config.update_settings(settings).await {
        Ok(stored) => CommandResult::ok(stored.into()),
        Err(e) => CommandResult::err(format!("failed to save settings: {e}")),
    }
}

/// Runs one discovery query on the active channel and returns the new list.
///
/// The device list is locked only to apply the result, so
/// [`get_device_list`] keeps answering while the query is in flight.  On
/// failure the controller keeps its previous list and the error is returned.
///
/// # Example (frontend)
/// ```ts
/// const devices = await invoke<CommandResult<DeviceRecord[]>>('get_nearby_devices');
/// ```
pub async fn get_nearby_devices(state: Arc<AppState>) -> CommandResult<Vec<DeviceRecord>> {
    let params = state.config.discovery_params().await;
    let client = state.device_list.lock().await.client();
    let result = client.discover_nearby_devices(&params).await;

    let mut device_list = state.device_list.lock().await;
    match device_list.apply(result) {
        Ok(_) => CommandResult::ok(device_list.devices().to_vec()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Returns the currently displayed device list without querying.
pub async fn get_device_list(state: Arc<AppState>) -> CommandResult<Vec<DeviceRecord>> {
    let device_list = state.device_list.lock().await;
    CommandResult::ok(device_list.devices().to_vec())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
