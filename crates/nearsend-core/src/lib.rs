//! # nearsend-core
//!
//! Shared domain types for NearSend, a local-network file-sharing client.
//!
//! This crate has no I/O.  It defines:
//!
//! - **`domain::settings`** – The [`Settings`] record (device name, multicast
//!   address, port), its defaults, the durable key names, and validation.
//!
//! - **`domain::device`** – The [`DeviceRecord`] a discovery engine reports for
//!   each nearby peer.  The client never interprets its fields; it passes them
//!   through to the UI unchanged.
//!
//! - **`domain::discovery`** – The [`DiscoveryParams`] handed to a discovery
//!   engine, derived from the active settings.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `nearsend_core::Settings` instead of `nearsend_core::domain::settings::Settings`.
pub use domain::device::DeviceRecord;
pub use domain::discovery::DiscoveryParams;
pub use domain::settings::{
    parse_port, SettingKey, Settings, SettingsValidationError, DEFAULT_DEVICE_NAME,
    DEFAULT_MULTICAST_ADDRESS, DEFAULT_PORT,
};
