//! Storage infrastructure: key-value backends for settings.
//!
//! Both backends implement
//! [`KeyValueStore`](crate::application::settings_store::KeyValueStore):
//!
//! - **`toml_file`** – A flat TOML table in the platform config directory.
//!   This is what the binary uses.
//! - **`memory`** – An in-process map with fault injection, for tests and for
//!   running without a writable disk.
//!
//! Seeding and default fallback live in the application layer, so swapping
//! the file format touches nothing outside this module.

pub mod memory;
pub mod toml_file;
