//! DiscoverDevices use case: one asynchronous "who is nearby?" query.
//!
//! [`DiscoveryClient`] forwards a single request to an injected
//! [`DiscoveryEngine`] and hands back either the device list or a
//! [`DiscoveryError`].  It adds no behaviour of its own on top of the engine:
//!
//! - **No retry.**  One call is exactly one engine query.  Callers that want
//!   retries wrap the call themselves.
//! - **No timeout.**  A call takes as long as the engine takes.  Callers that
//!   need a deadline should wrap the future in `tokio::time::timeout`.
//! - **No cancellation token.**  Dropping the future abandons the query; the
//!   call has no side effects on shared state.
//!
//! An empty list is a successful answer ("nobody is out there").  A failed
//! query is always an `Err`, never an empty list.

use std::sync::Arc;

use async_trait::async_trait;
use nearsend_core::{DeviceRecord, DiscoveryParams};
use thiserror::Error;
use tracing::debug;

/// Reasons a discovery query fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The engine could not be reached at all.
    #[error("discovery engine unreachable: {0}")]
    EngineUnreachable(String),

    /// The engine was reached but the network query itself failed.
    #[error("discovery network error: {0}")]
    Network(String),

    /// The engine answered with something that is not a device list.
    #[error("malformed discovery response: {0}")]
    MalformedResponse(String),
}

/// The external component that actually speaks the discovery protocol.
///
/// Production implementations listen on the multicast group; tests inject a
/// scripted engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryEngine: Send + Sync {
    /// Returns the devices currently reachable on the channel described by
    /// `params`, in no particular order.
    async fn query_nearby(
        &self,
        params: &DiscoveryParams,
    ) -> Result<Vec<DeviceRecord>, DiscoveryError>;
}

/// Issues discovery queries against an injected engine.
#[derive(Clone)]
pub struct DiscoveryClient {
    engine: Arc<dyn DiscoveryEngine>,
}

impl DiscoveryClient {
    pub fn new(engine: Arc<dyn DiscoveryEngine>) -> Self {
        Self { engine }
    }

    /// Sends one discovery request for the channel in `params`.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`DiscoveryError`] unchanged.
    pub async fn discover_nearby_devices(
        &self,
        params: &DiscoveryParams,
    ) -> Result<Vec<DeviceRecord>, DiscoveryError> {
        debug!(
            "querying nearby devices on {}:{}",
            params.multicast_address, params.port
        );
        let devices = self.engine.query_nearby(params).await?;
        debug!("discovery returned {} device(s)", devices.len());
        Ok(devices)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn make_device(alias: &str, ip: &str) -> DeviceRecord {
        DeviceRecord {
            alias: alias.to_string(),
            device_type: "desktop".to_string(),
            device_model: None,
            ip: ip.to_string(),
            port: 53317,
            ip_ending: None,
            fingerprint: format!("fp-{alias}"),
        }
    }

    #[tokio::test]
    async fn test_discover_returns_engine_devices_unchanged() {
        // Arrange
        let devices = vec![make_device("a", "10.0.0.2"), make_device("b", "10.0.0.3")];
        let expected = devices.clone();
        let mut engine = MockDiscoveryEngine::new();
        engine
            .expect_query_nearby()
            .times(1)
            .returning(move |_| Ok(devices.clone()));
        let client = DiscoveryClient::new(Arc::new(engine));

        // Act
        let result = client.discover_nearby_devices(&DiscoveryParams::default()).await;

        // Assert
        assert_eq!(result, Ok(expected));
    }

    #[tokio::test]
    async fn test_discover_passes_params_to_engine() {
        let params = DiscoveryParams {
            multicast_address: "239.9.9.9".to_string(),
            port: 7000,
            device_name: "Me".to_string(),
        };
        let mut engine = MockDiscoveryEngine::new();
        engine
            .expect_query_nearby()
            .with(eq(params.clone()))
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let client = DiscoveryClient::new(Arc::new(engine));

        assert!(client.discover_nearby_devices(&params).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let mut engine = MockDiscoveryEngine::new();
        engine.expect_query_nearby().returning(|_| Ok(Vec::new()));
        let client = DiscoveryClient::new(Arc::new(engine));

        let result = client.discover_nearby_devices(&DiscoveryParams::default()).await;

        assert_eq!(result, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_engine_failure_is_propagated_not_emptied() {
        let mut engine = MockDiscoveryEngine::new();
        engine
            .expect_query_nearby()
            .returning(|_| Err(DiscoveryError::Network("socket closed".to_string())));
        let client = DiscoveryClient::new(Arc::new(engine));

        let result = client.discover_nearby_devices(&DiscoveryParams::default()).await;

        assert_eq!(
            result,
            Err(DiscoveryError::Network("socket closed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failed_call_is_not_retried() {
        // `times(1)` makes the mock panic on a second query.
        let mut engine = MockDiscoveryEngine::new();
        engine
            .expect_query_nearby()
            .times(1)
            .returning(|_| Err(DiscoveryError::EngineUnreachable("down".to_string())));
        let client = DiscoveryClient::new(Arc::new(engine));

        let _ = client.discover_nearby_devices(&DiscoveryParams::default()).await;
    }

    #[test]
    fn test_discovery_error_messages_name_the_cause() {
        let err = DiscoveryError::MalformedResponse("expected array".to_string());
        assert_eq!(err.to_string(), "malformed discovery response: expected array");
    }
}
