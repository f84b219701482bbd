//! Dry-run execution wrapper.
//!
//! `Executor` is the ONLY path from the cleanup stages to the host. Every
//! destructive step is an `Action` handed to `Executor::execute`, which
//! either announces it with the dry-run marker and stops there, or announces
//! it with the exec marker and performs it. Read-only lookups go through
//! `query`/`read_file` and run in both modes.

use crate::command::{CommandRunner, HostCommand};
use crate::error::{Result, VmResetError};
use crate::wipe::WipeTarget;
use std::fmt;
use std::io::Write;
use std::path::Path;

pub const DRY_RUN_MARKER: &str = "[DRY-RUN]";
pub const EXEC_MARKER: &str = "[EXEC]";

/// A destructive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Invoke an external tool
    Run(HostCommand),
    /// Empty a directory in process
    Wipe(WipeTarget),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Run(cmd) => fmt::Display::fmt(cmd, f),
            Action::Wipe(target) => fmt::Display::fmt(target, f),
        }
    }
}

impl From<HostCommand> for Action {
    fn from(cmd: HostCommand) -> Self {
        Action::Run(cmd)
    }
}

impl From<WipeTarget> for Action {
    fn from(target: WipeTarget) -> Self {
        Action::Wipe(target)
    }
}

/// Routes actions to the host, or only prints them in dry-run mode.
pub struct Executor<R, W> {
    runner: R,
    out: W,
    dry_run: bool,
}

impl<R: CommandRunner, W: Write> Executor<R, W> {
    pub fn new(runner: R, out: W, dry_run: bool) -> Self {
        Self {
            runner,
            out,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Announce and (unless dry-run) perform an action. Failures propagate.
    pub fn execute(&mut self, action: &Action) -> Result<()> {
        if self.dry_run {
            self.say(format_args!("{} {}", DRY_RUN_MARKER, action))?;
            return Ok(());
        }

        self.say(format_args!("{} {}", EXEC_MARKER, action))?;
        match action {
            Action::Run(cmd) => self.runner.run(cmd),
            Action::Wipe(target) => {
                let removed = target.wipe()?;
                tracing::info!("Removed {} entries from {}", removed, target.dir.display());
                Ok(())
            }
        }
    }

    /// Like `execute`, but a failure is logged and swallowed.
    ///
    /// Returns whether the action succeeded.
    pub fn execute_tolerant(&mut self, action: &Action) -> Result<bool> {
        match self.execute(action) {
            Ok(()) => Ok(true),
            // Our own stdout going away is not the action failing
            Err(VmResetError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!("Ignoring failure of `{}`: {}", action, e);
                Ok(false)
            }
        }
    }

    /// Run a read-only command and return its stdout, in both modes.
    pub fn query(&mut self, cmd: &HostCommand) -> Result<String> {
        self.runner.capture(cmd)
    }

    /// Read a host file (e.g. the account database), in both modes.
    pub fn read_file(&mut self, path: &Path) -> Result<String> {
        tracing::debug!("read: {}", path.display());
        Ok(std::fs::read_to_string(path)?)
    }

    /// Print a progress line.
    pub fn say(&mut self, line: fmt::Arguments<'_>) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_parts(self) -> (R, W) {
        (self.runner, self.out)
    }
}
