//! vmreset library
//!
//! Resets a cloud Ubuntu VM to its minimal base install. The binary is a thin
//! shell around [`run_cleanup`]; everything that decides what happens lives
//! here so it can be driven with a fake [`CommandRunner`] in tests.

pub mod accounts;
pub mod cli;
pub mod command;
pub mod config;
pub mod confirm;
pub mod error;
pub mod executor;
pub mod packages;
pub mod process_guard;
pub mod report;
pub mod sanity;
pub mod stages;
pub mod wipe;

pub use cli::Cli;
pub use command::{CommandRunner, HostCommand, SystemRunner};
pub use config::CleanupConfig;
pub use error::{Result, VmResetError};
pub use executor::{Action, Executor, DRY_RUN_MARKER, EXEC_MARKER};
pub use stages::{Cleanup, CleanupSummary, Stage};
pub use wipe::WipeTarget;

use std::io::{BufRead, Write};

/// Mode switches for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub dry_run: bool,
    pub assume_yes: bool,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            dry_run: cli.dry_run,
            assume_yes: cli.yes,
        }
    }
}

/// Confirmation gate, pre-flight, then the seven stages.
///
/// `preflight` runs only for real runs, after the operator confirmed.
pub fn run_cleanup<R, I, W, P>(
    options: RunOptions,
    config: &CleanupConfig,
    runner: R,
    input: &mut I,
    mut out: W,
    preflight: P,
) -> Result<CleanupSummary>
where
    R: CommandRunner,
    I: BufRead,
    W: Write,
    P: FnOnce() -> Result<()>,
{
    if !options.assume_yes {
        confirm::require_confirmation(input, &mut out)?;
    }
    if !options.dry_run {
        preflight()?;
    }

    tracing::info!(
        "Starting cleanup (dry_run={}, min_uid={})",
        options.dry_run,
        config.min_uid
    );
    let exec = Executor::new(runner, out, options.dry_run);
    Cleanup::new(config, exec).run()
}
