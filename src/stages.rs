//! The cleanup stage sequence.
//!
//! Seven stages run in a fixed order. Each stage is built from `Action`s
//! handed to the `Executor`; none of them touches the host directly.
//!
//! # Failure policy
//!
//! | Stage | On failure |
//! |-------|------------|
//! | 2. reclassify manual packages | warn, continue |
//! | 5. per-account deletion | warn, continue with next account |
//! | everything else | abort the run |

use crate::accounts::{deletable_accounts, parse_passwd};
use crate::command::{CommandRunner, HostCommand};
use crate::config::CleanupConfig;
use crate::error::Result;
use crate::executor::{Action, Executor};
use crate::packages::{parse_package_list, protected_set};
use crate::report;
use std::collections::BTreeSet;
use std::io::Write;
use strum::{Display, EnumCount, EnumIter};

/// Cleanup stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumCount)]
pub enum Stage {
    #[strum(to_string = "Protect base packages")]
    ProtectBase,
    #[strum(to_string = "Mark remaining packages as auto-installed")]
    ReclassifyManual,
    #[strum(to_string = "Purge auto-installed packages")]
    PurgeAuto,
    #[strum(to_string = "Autoremove and clean package cache")]
    AutoremoveClean,
    #[strum(to_string = "Delete non-root accounts")]
    DeleteAccounts,
    #[strum(to_string = "Wipe home, temp, root and log directories")]
    WipeFilesystem,
    #[strum(to_string = "Vacuum system journal")]
    VacuumJournal,
}

impl Stage {
    /// 1-based position in the sequence.
    pub fn number(self) -> usize {
        self as usize + 1
    }
}

/// What a run did, for the completion report and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    pub protected: usize,
    pub reclassified: bool,
    pub purged: usize,
    pub accounts_deleted: Vec<String>,
    pub accounts_failed: Vec<String>,
}

/// Drives the stage sequence through an executor.
pub struct Cleanup<'c, R, W> {
    config: &'c CleanupConfig,
    exec: Executor<R, W>,
    summary: CleanupSummary,
}

impl<'c, R: CommandRunner, W: Write> Cleanup<'c, R, W> {
    pub fn new(config: &'c CleanupConfig, exec: Executor<R, W>) -> Self {
        Self {
            config,
            exec,
            summary: CleanupSummary::default(),
        }
    }

    /// Run all stages in order, then print the completion report.
    pub fn run(&mut self) -> Result<CleanupSummary> {
        let protected = self.protect_base_packages()?;
        self.reclassify_manual(&protected)?;
        self.purge_auto()?;
        self.autoremove_and_clean()?;
        self.delete_accounts()?;
        self.wipe_filesystem()?;
        self.vacuum_journal()?;

        let message = report::completion_message(self.exec.is_dry_run(), chrono::Local::now());
        for line in message.lines() {
            self.exec.say(format_args!("{}", line))?;
        }
        Ok(self.summary.clone())
    }

    fn announce(&mut self, stage: Stage) -> Result<()> {
        tracing::info!("Stage {}: {}", stage.number(), stage);
        self.exec.say(format_args!(
            "==> [{}/{}] {}",
            stage.number(),
            Stage::COUNT,
            stage
        ))
    }

    /// Stage 1: mark base groups and their direct dependencies as manual.
    pub fn protect_base_packages(&mut self) -> Result<BTreeSet<String>> {
        self.announce(Stage::ProtectBase)?;

        let depends = self.exec.query(
            &HostCommand::apt("apt-cache")
                .args([
                    "depends",
                    "--no-recommends",
                    "--no-suggests",
                    "--no-conflicts",
                    "--no-breaks",
                    "--no-replaces",
                    "--no-enhances",
                ])
                .args(self.config.base_packages.iter().cloned()),
        )?;
        let protected = protected_set(&self.config.base_packages, &depends);
        self.summary.protected = protected.len();

        let mark = HostCommand::apt("apt-mark")
            .arg("manual")
            .args(protected.iter().cloned());
        self.exec.execute(&mark.into())?;
        Ok(protected)
    }

    /// Stage 2: mark every other manual package as auto. Failure is tolerated.
    pub fn reclassify_manual(&mut self, protected: &BTreeSet<String>) -> Result<()> {
        self.announce(Stage::ReclassifyManual)?;

        let manual = match self
            .exec
            .query(&HostCommand::apt("apt-mark").arg("showmanual"))
        {
            Ok(out) => parse_package_list(&out),
            Err(e) => {
                tracing::warn!("Could not list manual packages, skipping reclassification: {}", e);
                return Ok(());
            }
        };
        let others: Vec<String> = manual
            .into_iter()
            .filter(|p| !protected.contains(p))
            .collect();

        if others.is_empty() {
            self.exec
                .say(format_args!("No other manually-installed packages, nothing to mark."))?;
            return Ok(());
        }

        let mark = HostCommand::apt("apt-mark").arg("auto").args(others);
        self.summary.reclassified = self.exec.execute_tolerant(&mark.into())?;
        Ok(())
    }

    /// Stage 3: purge everything flagged auto-installed in one batch.
    pub fn purge_auto(&mut self) -> Result<()> {
        self.announce(Stage::PurgeAuto)?;

        let auto = parse_package_list(
            &self
                .exec
                .query(&HostCommand::apt("apt-mark").arg("showauto"))?,
        );
        if auto.is_empty() {
            self.exec
                .say(format_args!("No auto-installed packages to purge."))?;
            return Ok(());
        }

        self.summary.purged = auto.len();
        let purge = HostCommand::apt("apt-get").args(["purge", "-y"]).args(auto);
        self.exec.execute(&purge.into())
    }

    /// Stage 4: drop orphaned dependencies and the download cache.
    pub fn autoremove_and_clean(&mut self) -> Result<()> {
        self.announce(Stage::AutoremoveClean)?;

        let autoremove = HostCommand::apt("apt-get").args(["autoremove", "--purge", "-y"]);
        self.exec.execute(&autoremove.into())?;
        self.exec
            .execute(&HostCommand::apt("apt-get").arg("clean").into())
    }

    /// Stage 5: delete each regular account and its home. Per-account
    /// failures are tolerated.
    pub fn delete_accounts(&mut self) -> Result<()> {
        self.announce(Stage::DeleteAccounts)?;

        let content = self.exec.read_file(&self.config.account_db)?;
        let accounts = parse_passwd(&content);
        let targets: Vec<String> =
            deletable_accounts(&accounts, self.config.min_uid, &self.config.protected_users)
                .into_iter()
                .map(|a| {
                    tracing::debug!("Selected {} (uid {}, home {})", a.name, a.uid, a.home);
                    a.name.clone()
                })
                .collect();

        if targets.is_empty() {
            self.exec.say(format_args!(
                "No accounts with uid >= {} to delete.",
                self.config.min_uid
            ))?;
            return Ok(());
        }

        for name in targets {
            let userdel = HostCommand::new("userdel").arg("--remove").arg(name.clone());
            if self.exec.execute_tolerant(&userdel.into())? {
                self.summary.accounts_deleted.push(name);
            } else {
                self.summary.accounts_failed.push(name);
            }
        }
        Ok(())
    }

    /// Stage 6: empty the configured directories.
    pub fn wipe_filesystem(&mut self) -> Result<()> {
        self.announce(Stage::WipeFilesystem)?;

        for target in &self.config.wipe_targets {
            self.exec.execute(&Action::Wipe(target.clone()))?;
        }
        Ok(())
    }

    /// Stage 7: rotate the journal, then vacuum everything older than the
    /// configured age.
    pub fn vacuum_journal(&mut self) -> Result<()> {
        self.announce(Stage::VacuumJournal)?;

        self.exec
            .execute(&HostCommand::new("journalctl").arg("--rotate").into())?;
        let vacuum = HostCommand::new("journalctl")
            .arg(format!("--vacuum-time={}", self.config.journal_vacuum_time));
        self.exec.execute(&vacuum.into())
    }
}
