//! Filesystem wipe targets.
//!
//! A target names a directory whose entries are all removed, except entries
//! whose file name matches one of the `keep` glob patterns. The directory
//! itself is left in place. Hidden entries are removed too.

use crate::error::{Result, VmResetError};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// A directory to empty, with optional entries to spare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeTarget {
    pub dir: PathBuf,
    #[serde(default)]
    pub keep: Vec<String>,
}

impl WipeTarget {
    /// Remove everything inside `dir`.
    pub fn all(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep: Vec::new(),
        }
    }

    /// Remove everything inside `dir` except names matching `keep`.
    pub fn keeping(dir: impl Into<PathBuf>, keep: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            keep: keep.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dir.is_absolute() {
            return Err(VmResetError::config(format!(
                "wipe target must be absolute: {}",
                self.dir.display()
            )));
        }
        if self.dir.parent().is_none() {
            return Err(VmResetError::config("refusing to wipe the filesystem root"));
        }
        self.patterns().map(|_| ())
    }

    fn patterns(&self) -> Result<Vec<Pattern>> {
        self.keep
            .iter()
            .map(|k| {
                Pattern::new(k)
                    .map_err(|e| VmResetError::config(format!("invalid keep pattern {:?}: {}", k, e)))
            })
            .collect()
    }

    /// Remove the directory's entries. Returns how many were removed.
    ///
    /// A missing directory counts as already empty.
    pub fn wipe(&self) -> Result<usize> {
        let keep = self.patterns()?;

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} does not exist, nothing to wipe", self.dir.display());
                return Ok(0);
            }
            Err(e) => return Err(VmResetError::wipe(&self.dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| VmResetError::wipe(&self.dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if keep.iter().any(|p| p.matches(&name)) {
                tracing::debug!("Keeping {}", entry.path().display());
                continue;
            }
            let path = entry.path();
            remove_entry(&path).map_err(|e| VmResetError::wipe(path, e))?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Remove a file, symlink or directory tree. Symlinks are never followed.
fn remove_entry(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        // Raced with something else deleting it (e.g. a tmp cleaner)
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl fmt::Display for WipeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remove contents of {}", self.dir.display())?;
        if !self.keep.is_empty() {
            write!(f, " (keeping {})", self.keep.join(", "))?;
        }
        Ok(())
    }
}
