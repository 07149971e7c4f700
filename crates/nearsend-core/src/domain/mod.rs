//! Domain entities for NearSend.
//!
//! Pure data and rules with no infrastructure dependencies.  Storage, the
//! change-notification channel, and the discovery engine all live in the
//! `nearsend-client` crate and depend on these types, never the other way
//! round.

/// Discovered peer descriptors.
pub mod device;

/// Parameters handed to a discovery engine.
pub mod discovery;

/// The persisted settings record, its defaults, and its durable key names.
///
/// See [`settings::Settings`] for the main type.
pub mod settings;
