//! Descriptor for one peer reported by a discovery engine.
//!
//! The client treats every field as opaque: it never branches on them and
//! hands the record to the UI exactly as the engine produced it.  Keys are
//! camelCase on the wire to match what the UI layer expects.

use serde::{Deserialize, Serialize};

/// A nearby device found by one discovery query.
///
/// Records live only as long as the query result that carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Name the peer advertises (its own `device_name`).
    pub alias: String,
    /// Coarse device class, e.g. `"desktop"` or `"mobile"`.
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    /// Source IP the announcement arrived from.
    pub ip: String,
    pub port: u16,
    /// Last octet of `ip`, used by compact list views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_ending: Option<String>,
    /// Random identifier the peer generates at startup and repeats in every
    /// announcement.
    #[serde(default)]
    pub fingerprint: String,
}

impl DeviceRecord {
    /// Returns the last dotted component of `ip`, if it has one.
    pub fn derive_ip_ending(&self) -> Option<String> {
        self.ip
            .rsplit('.')
            .next()
            .filter(|octet| !octet.is_empty() && *octet != self.ip)
            .map(str::to_string)
    }
}
