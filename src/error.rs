//! Error handling module for vmreset
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Errors are split in two by the stages: the two tolerated spots swallow them
//! with a warning, everything else propagates to `main` and ends the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vmreset
#[derive(Error, Debug)]
pub enum VmResetError {
    /// IO errors (wipe targets, account database, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A wipe target or one of its entries could not be removed
    #[error("Failed to wipe {}: {source}", .path.display())]
    Wipe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON deserialization errors from a configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An external tool could not be started at all
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran and exited non-zero (or was killed)
    #[error("Command failed ({}): {command}", describe_status(.code))]
    CommandFailed { command: String, code: Option<i32> },

    /// Operator declined the confirmation gate
    #[error("Aborted.")]
    Aborted,

    /// Run was interrupted by a signal
    #[error("Interrupted.")]
    Interrupted { signal: i32 },

    /// Pre-flight environment check failed
    #[error("Pre-flight check failed: {0}")]
    Preflight(String),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "killed by signal".to_string(),
    }
}

/// Result type alias for vmreset operations
pub type Result<T> = std::result::Result<T, VmResetError>;

impl VmResetError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a wipe error for `path`
    pub fn wipe(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Wipe {
            path: path.into(),
            source,
        }
    }

    /// Create a pre-flight error
    pub fn preflight(msg: impl Into<String>) -> Self {
        Self::Preflight(msg.into())
    }

    /// Process exit status for this error.
    ///
    /// A failed external tool hands its own status through, an interrupt
    /// maps to 128 + signal, everything else to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code: Some(c), .. } if *c != 0 => *c,
            Self::Interrupted { signal } => 128 + signal,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VmResetError::config("min_uid must be non-zero");
        assert_eq!(err.to_string(), "Configuration error: min_uid must be non-zero");

        assert_eq!(VmResetError::Aborted.to_string(), "Aborted.");
        let err = VmResetError::Interrupted {
            signal: nix::libc::SIGTERM,
        };
        assert_eq!(err.to_string(), "Interrupted.");
    }

    #[test]
    fn test_command_failed_display() {
        let err = VmResetError::CommandFailed {
            command: "apt-get clean".to_string(),
            code: Some(100),
        };
        assert_eq!(err.to_string(), "Command failed (exit code 100): apt-get clean");

        let err = VmResetError::CommandFailed {
            command: "journalctl --rotate".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("killed by signal"));
    }

    #[test]
    fn test_exit_code_inherits_tool_status() {
        let err = VmResetError::CommandFailed {
            command: "apt-get purge -y foo".to_string(),
            code: Some(100),
        };
        assert_eq!(err.exit_code(), 100);

        let err = VmResetError::CommandFailed {
            command: "apt-get purge -y foo".to_string(),
            code: None,
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_always_non_zero() {
        assert_eq!(VmResetError::Aborted.exit_code(), 1);
        let err = VmResetError::Interrupted {
            signal: nix::libc::SIGINT,
        };
        assert_eq!(err.exit_code(), 130);
        let err = VmResetError::Interrupted {
            signal: nix::libc::SIGHUP,
        };
        assert_eq!(err.exit_code(), 129);
        assert_eq!(VmResetError::config("x").exit_code(), 1);
        assert_eq!(VmResetError::preflight("x").exit_code(), 1);
    }

    #[test]
    fn test_wipe_error_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = VmResetError::wipe("/var/log/journal", io_err);
        assert_eq!(err.to_string(), "Failed to wipe /var/log/journal: denied");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: VmResetError = io_err.into();
        assert!(matches!(err, VmResetError::Io(_)));
    }
}
