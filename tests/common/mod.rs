//! Common test utilities for vmreset integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vmreset::{CleanupConfig, CommandRunner, HostCommand, Result, VmResetError, WipeTarget};

/// Canned `apt-cache depends` output for the default base groups
pub const BASE_DEPENDS: &str = "\
ubuntu-minimal
  Depends: adduser
  Depends: apt
  PreDepends: dpkg
  Recommends: rsyslog
ubuntu-standard
  Depends: less
";

/// Runner that records every call and answers queries from canned output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    /// Destructive commands, in order
    pub ran: Vec<String>,
    /// Read-only queries, in order
    pub queried: Vec<String>,
    responses: HashMap<String, String>,
    failing: Vec<String>,
}

impl RecordingRunner {
    /// Runner with a typical host: one extra manual package, two auto ones.
    pub fn typical() -> Self {
        Self::default()
            .respond("apt-cache depends", BASE_DEPENDS)
            .respond("apt-mark showmanual", "adduser\napt\nubuntu-minimal\nvim\ncurl\n")
            .respond("apt-mark showauto", "libfoo1\nlibbar2\n")
    }

    /// Answer queries whose `program first-arg` matches `key`.
    pub fn respond(mut self, key: &str, output: &str) -> Self {
        self.responses.insert(key.to_string(), output.to_string());
        self
    }

    /// Make the exact command line `line` fail with exit code 1.
    pub fn fail(mut self, line: &str) -> Self {
        self.failing.push(line.to_string());
        self
    }

    pub fn ran_matching(&self, prefix: &str) -> Vec<&String> {
        self.ran.iter().filter(|l| l.starts_with(prefix)).collect()
    }

    fn key(cmd: &HostCommand) -> String {
        match cmd.args.first() {
            Some(first) => format!("{} {}", cmd.program, first),
            None => cmd.program.clone(),
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, cmd: &HostCommand) -> Result<()> {
        let line = cmd.to_string();
        self.ran.push(line.clone());
        if self.failing.contains(&line) {
            return Err(VmResetError::CommandFailed {
                command: line,
                code: Some(1),
            });
        }
        Ok(())
    }

    fn capture(&mut self, cmd: &HostCommand) -> Result<String> {
        let line = cmd.to_string();
        self.queried.push(line.clone());
        if self.failing.contains(&line) {
            return Err(VmResetError::CommandFailed {
                command: line,
                code: Some(1),
            });
        }
        Ok(self
            .responses
            .get(&Self::key(cmd))
            .cloned()
            .unwrap_or_default())
    }
}

pub const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
systemd-network:x:998:998:systemd Network Management:/:/usr/sbin/nologin
alice:x:1001:1001:,,,:/home/alice:/bin/bash
bob:x:1002:1002:,,,:/home/bob:/bin/bash
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
";

/// A fake host filesystem rooted in a temp directory.
pub struct TestHost {
    pub temp: TempDir,
    pub config: CleanupConfig,
}

impl TestHost {
    pub fn new(passwd: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();

        let account_db = root.join("etc/passwd");
        write(&account_db, passwd);

        write(&root.join("home/alice/.bashrc"), "alias ll='ls -l'");
        write(&root.join("var/tmp/build.o"), "obj");
        write(&root.join("tmp/session"), "x");
        write(&root.join("root/.bash_history"), "rm -rf /");
        write(&root.join("root/.ssh/authorized_keys"), "ssh-ed25519 AAAA");
        write(&root.join("var/log/syslog"), "log line");

        let config = CleanupConfig {
            account_db,
            wipe_targets: vec![
                WipeTarget::all(root.join("home")),
                WipeTarget::all(root.join("var/tmp")),
                WipeTarget::all(root.join("tmp")),
                WipeTarget::keeping(root.join("root"), &[".ssh*"]),
                WipeTarget::all(root.join("var/log")),
            ],
            ..CleanupConfig::default()
        };

        Self { temp, config }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(rel)
    }

    pub fn is_empty(&self, rel: &str) -> bool {
        fs::read_dir(self.path(rel))
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(path, content).expect("Failed to write test file");
}
