//! In-process peer table used as the discovery engine.
//!
//! The multicast listener (a separate component) hears announcements from
//! peers and feeds each one into a [`PeerTableEngine`], either directly via
//! [`PeerTableEngine::record_peer`] or through a channel handed to
//! [`PeerTableEngine::spawn_feed`].  A discovery query then answers from the
//! table without touching the network.
//!
//! # Table rules
//!
//! - Peers are keyed by IP.  A later announcement from the same IP replaces
//!   the earlier record (the peer may have been renamed).
//! - Announcements carrying our own fingerprint are our multicast echo and
//!   are ignored.
//! - `ip_ending` is filled in from the IP when the announcement lacks it.
//!
//! # Channel check
//!
//! A query for a channel whose address is not an IPv4 multicast group fails
//! with [`DiscoveryError::Network`].

use std::net::Ipv4Addr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use nearsend_core::{DeviceRecord, DiscoveryParams};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::discover_devices::{DiscoveryEngine, DiscoveryError};

/// Discovery engine answering from peers announced on the local network.
pub struct PeerTableEngine {
    own_fingerprint: String,
    peers: RwLock<Vec<DeviceRecord>>,
    reachable: AtomicBool,
}

impl PeerTableEngine {
    /// `own_fingerprint` identifies this installation so its own
    /// announcements are skipped.
    pub fn new(own_fingerprint: impl Into<String>) -> Self {
        Self {
            own_fingerprint: own_fingerprint.into(),
            peers: RwLock::new(Vec::new()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Creates an engine with a fresh random fingerprint for this run.
    pub fn with_generated_fingerprint() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// The fingerprint this installation announces itself with.
    pub fn own_fingerprint(&self) -> &str {
        &self.own_fingerprint
    }

    /// Adds or replaces a peer.  Returns `true` if the peer was not yet known.
    pub async fn record_peer(&self, mut record: DeviceRecord) -> bool {
        if !self.own_fingerprint.is_empty() && record.fingerprint == self.own_fingerprint {
            debug!("ignoring own announcement from {}", record.ip);
            return false;
        }
        if record.ip_ending.is_none() {
            record.ip_ending = record.derive_ip_ending();
        }

        let mut peers = self.peers.write().await;
        match peers.iter_mut().find(|p| p.ip == record.ip) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                info!("new peer {:?} at {}", record.alias, record.ip);
                peers.push(record);
                true
            }
        }
    }

    /// Removes the peer at `ip`.  Returns `true` if it was present.
    pub async fn forget_peer(&self, ip: &str) -> bool {
        let mut peers = self.peers.write().await;
        let before = peers.len();
        peers.retain(|p| p.ip != ip);
        peers.len() != before
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Marks the engine as reachable or not.  While unreachable every query
    /// fails with [`DiscoveryError::EngineUnreachable`].
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Records every announcement received on `rx` until the sender side is
    /// dropped.
    pub fn spawn_feed(self: Arc<Self>, mut rx: mpsc::Receiver<DeviceRecord>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                self.record_peer(record).await;
            }
            debug!("peer announcement feed closed");
        })
    }
}

#[async_trait]
impl DiscoveryEngine for PeerTableEngine {
    async fn query_nearby(
        &self,
        params: &DiscoveryParams,
    ) -> Result<Vec<DeviceRecord>, DiscoveryError> {
        if !self.reachable.load(Ordering::Relaxed) {
            return Err(DiscoveryError::EngineUnreachable(
                "peer table is offline".to_string(),
            ));
        }

        match params.multicast_address.trim().parse::<Ipv4Addr>() {
            Ok(group) if group.is_multicast() => {}
            _ => {
                return Err(DiscoveryError::Network(format!(
                    "cannot listen on {}:{}: not an IPv4 multicast group",
                    params.multicast_address, params.port
                )))
            }
        }

        Ok(self.peers.read().await.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(alias: &str, ip: &str, fingerprint: &str) -> DeviceRecord {
        DeviceRecord {
            alias: alias.to_string(),
            device_type: "desktop".to_string(),
            device_model: Some("linux".to_string()),
            ip: ip.to_string(),
            port: 53317,
            ip_ending: None,
            fingerprint: fingerprint.to_string(),
        }
    }

    #[tokio::test]
    async fn test_query_on_empty_table_returns_empty_list() {
        let engine = PeerTableEngine::new("me");

        let result = engine.query_nearby(&DiscoveryParams::default()).await;

        assert_eq!(result, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_record_peer_fills_ip_ending() {
        // Arrange
        let engine = PeerTableEngine::new("me");

        // Act
        assert!(engine.record_peer(make_record("Desk", "192.168.1.23", "fp-a")).await);
        let devices = engine.query_nearby(&DiscoveryParams::default()).await.unwrap();

        // Assert
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_ending.as_deref(), Some("23"));
    }

    #[tokio::test]
    async fn test_record_peer_replaces_same_ip() {
        let engine = PeerTableEngine::new("me");
        engine.record_peer(make_record("Old Name", "10.0.0.4", "fp-a")).await;

        let is_new = engine.record_peer(make_record("New Name", "10.0.0.4", "fp-a")).await;

        assert!(!is_new);
        let devices = engine.query_nearby(&DiscoveryParams::default()).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].alias, "New Name");
    }

    #[tokio::test]
    async fn test_own_announcement_is_ignored() {
        let engine = PeerTableEngine::new("me");

        assert!(!engine.record_peer(make_record("Self", "10.0.0.1", "me")).await);
        assert_eq!(engine.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_generated_fingerprints_are_distinct_and_skip_own_echo() {
        // Arrange
        let first = PeerTableEngine::with_generated_fingerprint();
        let second = PeerTableEngine::with_generated_fingerprint();
        let echo = make_record("Self", "10.0.0.1", first.own_fingerprint());

        // Act
        let recorded_by_first = first.record_peer(echo.clone()).await;
        let recorded_by_second = second.record_peer(echo).await;

        // Assert
        assert_ne!(first.own_fingerprint(), second.own_fingerprint());
        assert!(Uuid::parse_str(first.own_fingerprint()).is_ok());
        assert!(!recorded_by_first);
        assert!(recorded_by_second);
    }

    #[tokio::test]
    async fn test_forget_peer_removes_entry() {
        let engine = PeerTableEngine::new("me");
        engine.record_peer(make_record("Desk", "10.0.0.4", "fp-a")).await;

        assert!(engine.forget_peer("10.0.0.4").await);
        assert!(!engine.forget_peer("10.0.0.4").await);
        assert_eq!(engine.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_unreachable_engine_fails_query() {
        let engine = PeerTableEngine::new("me");
        engine.record_peer(make_record("Desk", "10.0.0.4", "fp-a")).await;
        engine.set_reachable(false);

        let result = engine.query_nearby(&DiscoveryParams::default()).await;

        assert!(matches!(result, Err(DiscoveryError::EngineUnreachable(_))));
    }

    #[tokio::test]
    async fn test_non_multicast_channel_fails_query() {
        let engine = PeerTableEngine::new("me");
        let params = DiscoveryParams {
            multicast_address: "192.168.1.1".to_string(),
            ..DiscoveryParams::default()
        };

        let result = engine.query_nearby(&params).await;

        assert!(matches!(result, Err(DiscoveryError::Network(_))));
    }

    #[tokio::test]
    async fn test_spawn_feed_records_announcements_until_closed() {
        // Arrange
        let engine = Arc::new(PeerTableEngine::new("me"));
        let (tx, rx) = mpsc::channel(8);
        let handle = Arc::clone(&engine).spawn_feed(rx);

        // Act
        tx.send(make_record("A", "10.0.0.2", "fp-a")).await.unwrap();
        tx.send(make_record("B", "10.0.0.3", "fp-b")).await.unwrap();
        drop(tx);
        handle.await.expect("feed task must finish when sender drops");

        // Assert
        assert_eq!(engine.peer_count().await, 2);
    }
}
