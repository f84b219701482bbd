//! Confirmation gate
//!
//! Prints what is about to be lost and requires the literal reply `yes`.

use crate::error::{Result, VmResetError};
use std::io::{BufRead, Write};

/// The only reply that lets the run continue.
pub const CONFIRMATION_WORD: &str = "yes";

const WARNING: &str = "\
WARNING: this irreversibly resets this machine to a minimal base install.
It will permanently:
  * delete every non-root user account and its home directory
  * purge every package not part of the base install (manually tracked ones included)
  * wipe logs, caches and temporary data
";

/// Show the warning on `out` and read one line from `input`.
///
/// Succeeds only if the line is exactly `yes`. The line terminator is the
/// only thing stripped. End of input and non-UTF-8 bytes count as a refusal.
pub fn require_confirmation<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<()> {
    write!(out, "{}Type '{}' to continue: ", WARNING, CONFIRMATION_WORD)?;
    out.flush()?;

    let mut line = Vec::new();
    input.read_until(b'\n', &mut line)?;

    if is_confirmation(&line) {
        tracing::info!("Operator confirmed cleanup");
        Ok(())
    } else {
        tracing::info!("Operator declined cleanup");
        Err(VmResetError::Aborted)
    }
}

/// Whether a raw input line (terminator included) is the confirmation word.
pub fn is_confirmation(line: &[u8]) -> bool {
    let reply = line
        .strip_suffix(b"\n")
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .unwrap_or(line);
    reply == CONFIRMATION_WORD.as_bytes()
}
