//! Pre-flight sanity checks for a real (non-dry) run
//!
//! Verifies before anything destructive happens:
//! - Running with root privileges (EUID 0)
//! - The package, account and journal tools are on PATH

use crate::error::{Result, VmResetError};
use crate::process_guard::CommandProcessGroup;
use std::process::{Command, Stdio};

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }

    /// Convert into an error naming every failed check.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        let mut problems = Vec::new();
        if !self.is_root {
            problems.push("must run as root (try: sudo vmreset)".to_string());
        }
        if !self.missing_binaries.is_empty() {
            problems.push(format!(
                "missing required tools: {}",
                self.missing_binaries.join(", ")
            ));
        }
        Err(VmResetError::preflight(problems.join("; ")))
    }
}

/// Tools the stages shell out to
pub const REQUIRED_BINARIES: &[&str] = &[
    "apt-cache",  // dependency lookup (stage 1)
    "apt-mark",   // manual/auto flags (stages 1-3)
    "apt-get",    // purge, autoremove, clean (stages 3-4)
    "userdel",    // account removal (stage 5, passwd package)
    "journalctl", // journal rotate/vacuum (stage 7, systemd)
];

fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .in_new_process_group()
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Perform all sanity checks and return the result
pub fn verify_environment() -> SanityCheckResult {
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|b| !binary_exists(b))
        .map(|b| (*b).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}
