//! The persisted settings record.
//!
//! A [`Settings`] value always has all three fields populated.  The seeding
//! logic and the fallback-on-read logic in the client both take their values
//! from the `DEFAULT_*` constants below, so the two can never drift apart.
//!
//! # Durable layout
//!
//! Each field is stored under its own key as a string:
//!
//! | Key                 | Value                     |
//! |---------------------|---------------------------|
//! | `device_name`       | free text, non-empty      |
//! | `multicast_address` | IPv4 dotted quad          |
//! | `port`              | decimal text, 1..=65535   |

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name advertised to peers when nothing else has been configured.
pub const DEFAULT_DEVICE_NAME: &str = "Good Tomato";
/// Multicast group used for discovery announcements.
pub const DEFAULT_MULTICAST_ADDRESS: &str = "224.0.0.167";
/// Port used for discovery and transfers.
pub const DEFAULT_PORT: u16 = 53317;

/// Identifies one of the three durable settings keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    DeviceName,
    MulticastAddress,
    Port,
}

impl SettingKey {
    /// Every key, in the order they are seeded and read.
    pub const ALL: [SettingKey; 3] = [
        SettingKey::DeviceName,
        SettingKey::MulticastAddress,
        SettingKey::Port,
    ];

    /// The key name used in durable storage.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::DeviceName => "device_name",
            SettingKey::MulticastAddress => "multicast_address",
            SettingKey::Port => "port",
        }
    }

    /// The default value for this key, in its stored (text) form.
    pub fn default_value(self) -> String {
        match self {
            SettingKey::DeviceName => DEFAULT_DEVICE_NAME.to_string(),
            SettingKey::MulticastAddress => DEFAULT_MULTICAST_ADDRESS.to_string(),
            SettingKey::Port => DEFAULT_PORT.to_string(),
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a [`Settings`] value is rejected by [`Settings::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsValidationError {
    #[error("device name must not be empty")]
    EmptyDeviceName,

    #[error("multicast address {0:?} is not an IPv4 address")]
    InvalidMulticastAddress(String),

    #[error("address {0} is outside the IPv4 multicast range 224.0.0.0/4")]
    NotMulticast(Ipv4Addr),

    #[error("port must be in 1..=65535")]
    ZeroPort,
}

/// The canonical configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Human-readable identity advertised during discovery.
    pub device_name: String,
    /// IPv4 multicast group, kept as text.  Stored and forwarded as-is.
    pub multicast_address: String,
    /// Discovery / transfer port.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            multicast_address: DEFAULT_MULTICAST_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Returns the stored (text) form of the field named by `key`.
    pub fn value_for(&self, key: SettingKey) -> String {
        match key {
            SettingKey::DeviceName => self.device_name.clone(),
            SettingKey::MulticastAddress => self.multicast_address.clone(),
            SettingKey::Port => self.port.to_string(),
        }
    }

    /// Checks the rules a UI must enforce before handing settings to the
    /// configuration service.
    ///
    /// Storage itself accepts any well-formed value; this is for callers.
    ///
    /// # Errors
    ///
    /// Returns the first rule the value breaks.
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        if self.device_name.trim().is_empty() {
            return Err(SettingsValidationError::EmptyDeviceName);
        }

        let addr: Ipv4Addr = self.multicast_address.trim().parse().map_err(|_| {
            SettingsValidationError::InvalidMulticastAddress(self.multicast_address.clone())
        })?;
        if !addr.is_multicast() {
            return Err(SettingsValidationError::NotMulticast(addr));
        }

        if self.port == 0 {
            return Err(SettingsValidationError::ZeroPort);
        }
        Ok(())
    }
}

/// Parses a stored port value.
///
/// Returns `None` for anything that is not a decimal integer in `1..=65535`.
/// Surrounding whitespace is ignored.
pub fn parse_port(raw: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
