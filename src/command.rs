//! External command descriptions and the runner seam.
//!
//! `HostCommand` is a plain argv description. `CommandRunner` is the only
//! thing that actually starts processes; the production implementation is
//! `SystemRunner`, tests substitute a recorder.

use crate::error::{Result, VmResetError};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::fmt;
use std::process::{Command, Output, Stdio};

/// An external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// `apt-*` tool with debconf prompts disabled.
    pub fn apt(program: &str) -> Self {
        Self::new(program).env("DEBIAN_FRONTEND", "noninteractive")
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Renders as the command line an operator would type (env omitted).
impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Starts external tools on behalf of the executor.
pub trait CommandRunner {
    /// Run a command with inherited stdio. Non-zero exit is an error.
    fn run(&mut self, cmd: &HostCommand) -> Result<()>;

    /// Run a read-only command and return its stdout. Non-zero exit is an error.
    fn capture(&mut self, cmd: &HostCommand) -> Result<String>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &mut T {
    fn run(&mut self, cmd: &HostCommand) -> Result<()> {
        (**self).run(cmd)
    }

    fn capture(&mut self, cmd: &HostCommand) -> Result<String> {
        (**self).capture(cmd)
    }
}

/// Runs commands on the live host.
///
/// Every child gets its own process group and is registered with
/// `ChildRegistry::global()` for as long as it runs.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn_registered(&self, cmd: &HostCommand, mut command: Command) -> Result<Output> {
        let child = command
            .in_new_process_group()
            .spawn()
            .map_err(|source| VmResetError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;
        let pid = child.id();

        // A signal before registration misses this child; PR_SET_PDEATHSIG still ends it
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }
        let output = child.wait_with_output();
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let output = output?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(VmResetError::CommandFailed {
                command: cmd.to_string(),
                code: output.status.code(),
            })
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &HostCommand) -> Result<()> {
        tracing::info!("exec: {} {:?}", cmd.program, cmd.args);
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        self.spawn_registered(cmd, command).map(|_| ())
    }

    fn capture(&mut self, cmd: &HostCommand) -> Result<String> {
        tracing::debug!("query: {} {:?}", cmd.program, cmd.args);
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        let output = self.spawn_registered(cmd, command)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_command_line() {
        let cmd = HostCommand::apt("apt-get").args(["purge", "-y", "vim", "curl"]);
        assert_eq!(cmd.to_string(), "apt-get purge -y vim curl");
    }

    #[test]
    fn test_apt_sets_noninteractive() {
        let cmd = HostCommand::apt("apt-mark");
        assert_eq!(
            cmd.env,
            vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
        );
        assert!(HostCommand::new("userdel").env.is_empty());
    }

    #[test]
    fn test_capture_returns_stdout() {
        let mut runner = SystemRunner::new();
        let out = runner
            .capture(&HostCommand::new("echo").arg("hello"))
            .unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_run_propagates_exit_code() {
        let mut runner = SystemRunner::new();
        let err = runner
            .run(&HostCommand::new("sh").args(["-c", "exit 7"]))
            .unwrap_err();
        assert!(matches!(err, VmResetError::CommandFailed { code: Some(7), .. }));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_run_passes_env() {
        let mut runner = SystemRunner::new();
        let out = runner
            .capture(&HostCommand::apt("sh").args(["-c", "printf %s \"$DEBIAN_FRONTEND\""]))
            .unwrap();
        assert_eq!(out, "noninteractive");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut runner = SystemRunner::new();
        let err = runner
            .run(&HostCommand::new("vmreset-no-such-binary"))
            .unwrap_err();
        assert!(matches!(err, VmResetError::Spawn { .. }));
    }
}
