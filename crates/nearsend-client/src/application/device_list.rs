//! DeviceListController: the device list the UI displays.
//!
//! Each successful refresh replaces the list wholesale with whatever the
//! discovery query returned, including an empty list.  A failed refresh keeps
//! the previous list on screen and records the error so the UI can show it.

use nearsend_core::{DeviceRecord, DiscoveryParams};
use tracing::{info, warn};

use super::discover_devices::{DiscoveryClient, DiscoveryError};

/// Holds the most recent successful discovery result.
pub struct DeviceListController {
    client: DiscoveryClient,
    devices: Vec<DeviceRecord>,
    last_error: Option<DiscoveryError>,
}

impl DeviceListController {
    pub fn new(client: DiscoveryClient) -> Self {
        Self {
            client,
            devices: Vec::new(),
            last_error: None,
        }
    }

    /// The currently displayed devices.
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// The error from the most recent refresh, if it failed.
    pub fn last_error(&self) -> Option<&DiscoveryError> {
        self.last_error.as_ref()
    }

    /// The client this controller queries through.
    ///
    /// A controller shared behind a lock clones this, runs the query with the
    /// lock released, and then locks again to [`apply`](Self::apply) it.
    pub fn client(&self) -> DiscoveryClient {
        self.client.clone()
    }

    /// Runs one discovery query and applies its outcome.
    ///
    /// Returns the number of devices now displayed.
    ///
    /// # Errors
    ///
    /// Returns the query's [`DiscoveryError`]; the displayed list is left as
    /// it was.
    pub async fn refresh(&mut self, params: &DiscoveryParams) -> Result<usize, DiscoveryError> {
        let result = self.client.discover_nearby_devices(params).await;
        self.apply(result)
    }

    /// Applies the outcome of a discovery query to the displayed list.
    ///
    /// # Errors
    ///
    /// Returns the query's [`DiscoveryError`] unchanged.
    pub fn apply(
        &mut self,
        result: Result<Vec<DeviceRecord>, DiscoveryError>,
    ) -> Result<usize, DiscoveryError> {
        match result {
            Ok(devices) => {
                info!("device list refreshed: {} device(s)", devices.len());
                self.devices = devices;
                self.last_error = None;
                Ok(self.devices.len())
            }
            Err(e) => {
                warn!(
                    "discovery failed, keeping {} previously listed device(s): {e}",
                    self.devices.len()
                );
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
