//! Infrastructure layer for the client.
//!
//! Contains OS-facing adapters: settings file storage, the discovery engine,
//! and the UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `nearsend_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.

pub mod network;
pub mod storage;
pub mod ui_bridge;
