//! Parameters for one discovery query.

use serde::{Deserialize, Serialize};

use super::settings::Settings;

/// The active discovery channel and identity, taken from [`Settings`].
///
/// Discovery engines receive this as an argument instead of reading global
/// state, so a query can be issued against any settings value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryParams {
    /// Multicast group to announce on and listen to.  Opaque text.
    pub multicast_address: String,
    pub port: u16,
    /// Our own advertised name, so engines can skip self-announcements.
    pub device_name: String,
}

impl From<&Settings> for DiscoveryParams {
    fn from(settings: &Settings) -> Self {
        Self {
            multicast_address: settings.multicast_address.clone(),
            port: settings.port,
            device_name: settings.device_name.clone(),
        }
    }
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}
