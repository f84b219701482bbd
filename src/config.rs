//! Cleanup configuration
//!
//! Every knob has a default matching a stock Ubuntu cloud image, so running
//! without `--config` is the normal case. A JSON file may override any subset
//! of fields.

use crate::error::{Result, VmResetError};
use crate::wipe::WipeTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Lowest uid treated as a regular (non-system) account on Ubuntu.
pub const DEFAULT_MIN_UID: u32 = 1000;

/// Configuration for a cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Base package groups to keep, together with their direct dependencies.
    pub base_packages: Vec<String>,
    /// Accounts with a uid at or above this value are deleted.
    pub min_uid: u32,
    /// Account names never deleted even when above `min_uid`.
    pub protected_users: Vec<String>,
    /// Colon-delimited account database.
    pub account_db: PathBuf,
    /// Directories whose contents are wiped, in order.
    pub wipe_targets: Vec<WipeTarget>,
    /// Age passed to `journalctl --vacuum-time`.
    pub journal_vacuum_time: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            base_packages: vec!["ubuntu-minimal".to_string(), "ubuntu-standard".to_string()],
            min_uid: DEFAULT_MIN_UID,
            protected_users: vec!["nobody".to_string()],
            account_db: PathBuf::from("/etc/passwd"),
            wipe_targets: vec![
                WipeTarget::all("/home"),
                WipeTarget::all("/var/tmp"),
                WipeTarget::all("/tmp"),
                WipeTarget::keeping("/root", &[".ssh*"]),
                WipeTarget::all("/var/log"),
            ],
            journal_vacuum_time: "1s".to_string(),
        }
    }
}

impl CleanupConfig {
    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VmResetError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: CleanupConfig = serde_json::from_str(&content)?;
        tracing::debug!("Loaded cleanup configuration from {}", path.display());
        Ok(config)
    }

    /// Validate the configuration before anything runs.
    pub fn validate(&self) -> Result<()> {
        if self.base_packages.iter().all(|p| p.trim().is_empty()) {
            return Err(VmResetError::config("base_packages must name at least one package"));
        }
        if let Some(bad) = self.base_packages.iter().find(|p| p.starts_with('-')) {
            return Err(VmResetError::config(format!("invalid package name: {}", bad)));
        }
        if self.min_uid == 0 {
            return Err(VmResetError::config("min_uid must be non-zero (uid 0 is root)"));
        }
        for target in &self.wipe_targets {
            target.validate()?;
        }
        if self.journal_vacuum_time.trim().is_empty() {
            return Err(VmResetError::config("journal_vacuum_time must not be empty"));
        }
        Ok(())
    }
}
