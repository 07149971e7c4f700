//! TOML-file key-value store.
//!
//! Settings are kept as a flat table of string values in the
//! platform-appropriate config file:
//! - Windows:  `%APPDATA%\NearSend\settings.toml`
//! - Linux:    `~/.config/nearsend/settings.toml`
//! - macOS:    `~/Library/Application Support/NearSend/settings.toml`
//!
//! ```toml
//! device_name = "Good Tomato"
//! multicast_address = "224.0.0.167"
//! port = "53317"
//! ```
//!
//! # Failure mapping
//!
//! | Situation                            | `get` result                    |
//! |--------------------------------------|---------------------------------|
//! | file does not exist                  | `Ok(None)` for every key        |
//! | file unreadable (permissions, I/O)   | `StoreError::Unavailable`       |
//! | file is not valid TOML               | `StoreError::CorruptValue`      |
//! | key present but not a TOML string    | `StoreError::CorruptValue`      |
//!
//! Every `set` rewrites the whole file through a temporary sibling and a
//! rename, so a crash never leaves a half-written file behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use toml::{Table, Value};
use tracing::{debug, warn};

use crate::application::settings_store::{KeyValueStore, StoreError};

/// File name used inside the platform config directory.
const SETTINGS_FILE_NAME: &str = "settings.toml";

/// A [`KeyValueStore`] persisted as a TOML file.
pub struct TomlFileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl TomlFileStore {
    /// Uses the file at `path`.  Nothing is touched on disk until the first
    /// `get` or `set`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Uses `settings.toml` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the platform config base
    /// directory cannot be determined from the environment.
    pub fn at_default_location() -> Result<Self, StoreError> {
        Ok(Self::new(settings_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole table.  A missing file is an empty table.
    ///
    /// `key` is only used to label a parse failure.
    async fn load_table(&self, key: &str) -> Result<Table, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Table::new()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        toml::from_str::<Table>(&content).map_err(|e| StoreError::CorruptValue {
            key: key.to_string(),
            reason: format!("{} is not valid TOML: {e}", self.path.display()),
        })
    }

    /// Writes `table` atomically by renaming a fully written temp file.
    async fn save_table(&self, table: &Table) -> Result<(), StoreError> {
        let unavailable =
            |what: &str, e: std::io::Error| StoreError::Unavailable(format!("{what}: {e}"));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| unavailable(&format!("cannot create {}", dir.display()), e))?;
        }

        let content = toml::to_string_pretty(table)
            .map_err(|e| StoreError::Unavailable(format!("cannot serialize settings: {e}")))?;

        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| unavailable(&format!("cannot write {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| unavailable(&format!("cannot replace {}", self.path.display()), e))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for TomlFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let table = self.load_table(key).await?;
        match table.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(StoreError::CorruptValue {
                key: key.to_string(),
                reason: format!("expected a string, found {}", other.type_str()),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut table = match self.load_table(key).await {
            Ok(table) => table,
            Err(StoreError::CorruptValue { reason, .. }) => {
                warn!("replacing unreadable settings file: {reason}");
                Table::new()
            }
            Err(e) => return Err(e),
        };

        table.insert(key.to_string(), Value::String(value.to_string()));
        self.save_table(&table).await?;
        debug!("wrote `{key}` to {}", self.path.display());
        Ok(())
    }
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Resolves the full path to the settings file.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the base directory cannot be
/// determined.
pub fn settings_file_path() -> Result<PathBuf, StoreError> {
    platform_config_dir()
        .map(|dir| dir.join(SETTINGS_FILE_NAME))
        .ok_or_else(|| {
            StoreError::Unavailable("could not determine platform config directory".to_string())
        })
}

/// Resolves the platform config directory including the `NearSend` component.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("NearSend"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("nearsend"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("NearSend")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
