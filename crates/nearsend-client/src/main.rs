//! NearSend client entry point.
//!
//! Wires together the infrastructure services and starts the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ TomlFileStore            -- settings file ($NEARSEND_SETTINGS or platform dir)
//!  └─ PeerTableEngine          -- random fingerprint, fed by the listener channel
//!  └─ AppState::new()          -- configuration service + device list
//!  └─ settings event logger    (Tokio task)
//!  └─ config.initialize()      -- seeds defaults, publishes if seeded
//!  └─ get_nearby_devices()     -- first device list refresh
//! ```
//!
//! Set `NEARSEND_ONESHOT=1` to exit after the first refresh instead of
//! waiting for Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nearsend_core::DeviceRecord;
use nearsend_client::infrastructure::{
    network::peer_table::PeerTableEngine,
    storage::toml_file::TomlFileStore,
    ui_bridge::{self, AppState},
};

/// Overrides the settings file location.
const SETTINGS_PATH_ENV: &str = "NEARSEND_SETTINGS";
/// When set, exit after the first discovery refresh.
const ONESHOT_ENV: &str = "NEARSEND_ONESHOT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("NearSend client starting");

    let store = match std::env::var_os(SETTINGS_PATH_ENV) {
        Some(path) => TomlFileStore::new(path),
        None => TomlFileStore::at_default_location()
            .context("no settings location; set NEARSEND_SETTINGS")?,
    };
    info!("settings file: {}", store.path().display());

    // ── Discovery engine ──────────────────────────────────────────────────────
    let engine = Arc::new(PeerTableEngine::with_generated_fingerprint());
    info!("device fingerprint: {}", engine.own_fingerprint());

    // Attach point for the multicast announcement listener, which lives
    // outside this binary.  Each peer it hears is sent on `announcements_tx`.
    // With no listener attached the table stays empty and every refresh
    // reports zero devices.
    let (announcements_tx, announcements_rx) = mpsc::channel::<DeviceRecord>(64);
    let feed = Arc::clone(&engine).spawn_feed(announcements_rx);

    let state = AppState::new(Arc::new(store), engine);

    // ── Settings event logger ─────────────────────────────────────────────────
    let mut settings_events = state.config.subscribe();
    tokio::spawn(async move {
        while let Some(settings) = settings_events.recv().await {
            info!(
                "settings changed: device_name={:?} multicast_address={} port={}",
                settings.device_name, settings.multicast_address, settings.port
            );
        }
    });

    state.config.initialize().await;

    // ── First device list refresh ─────────────────────────────────────────────
    let result = ui_bridge::get_nearby_devices(Arc::clone(&state)).await;
    match (result.data, result.error) {
        (Some(devices), _) => info!(
            "nearby devices: {}",
            serde_json::to_string(&devices).unwrap_or_else(|_| format!("{} device(s)", devices.len()))
        ),
        (None, error) => warn!(
            "device discovery failed: {}",
            error.unwrap_or_else(|| "unknown error".to_string())
        ),
    }

    if std::env::var_os(ONESHOT_ENV).is_none() {
        info!("NearSend client ready.  Press Ctrl-C to exit.");
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        info!("shutdown signal received");
    }

    drop(announcements_tx);
    feed.await.context("peer feed task panicked")?;

    info!("NearSend client stopped");
    Ok(())
}
