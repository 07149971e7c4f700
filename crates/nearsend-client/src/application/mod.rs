//! Application layer use cases for the NearSend client.
//!
//! Code here orchestrates domain types from `nearsend_core` and depends only
//! on traits ([`settings_store::KeyValueStore`],
//! [`discover_devices::DiscoveryEngine`]) for anything that touches the disk
//! or the network.  Concrete backends are injected from `infrastructure`.
//!
//! # Sub-modules
//!
//! - **`settings_store`** – Seeds, reads, and writes the three settings keys
//!   with per-field fallback to defaults.
//!
//! - **`notifier`** – Ordered fan-out of settings-changed events.
//!
//! - **`configuration`** – The single writer of settings; runs seeding at
//!   startup and publishes changes.
//!
//! - **`discover_devices`** – One asynchronous discovery query against an
//!   injected engine.
//!
//! - **`device_list`** – The displayed device list: replaced on success,
//!   preserved on failure.

pub mod configuration;
pub mod device_list;
pub mod discover_devices;
pub mod notifier;
pub mod settings_store;
