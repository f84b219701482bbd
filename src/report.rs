//! Completion reporter.

use chrono::{DateTime, SecondsFormat, TimeZone};

/// Final lines printed after the last stage.
pub fn completion_message<Tz: TimeZone>(dry_run: bool, finished_at: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stamp = finished_at.to_rfc3339_opts(SecondsFormat::Secs, false);
    if dry_run {
        format!(
            "Cleanup finished at {}\nDry run: no changes were made, cleanup was skipped.",
            stamp
        )
    } else {
        format!(
            "Cleanup finished at {}\nReboot now to complete the reset: sudo reboot",
            stamp
        )
    }
}
