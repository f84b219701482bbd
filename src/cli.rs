use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// vmreset - reset a cloud Ubuntu VM to its minimal base install
///
/// Purges every non-base package, deletes all non-root accounts and their
/// homes, wipes /home, /tmp, /var/tmp, /root (except .ssh*) and /var/log,
/// and vacuums the journal. This cannot be undone.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "vmreset")]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Print actions instead of performing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the interactive confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Load cleanup configuration from a JSON file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// What `main` should do after parsing argv.
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Cli),
    /// `--help`/`--version`: message already rendered, exit 0
    Exit(String),
    /// Bad arguments: message for stderr, exit 1
    Usage(String),
}

impl Cli {
    pub fn parse_args() -> ParseOutcome {
        Self::parse_from_args(std::env::args_os())
    }

    /// Parse an argv, turning clap's errors into the tool's own messages.
    pub fn parse_from_args<I, T>(args: I) -> ParseOutcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => ParseOutcome::Run(cli),
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ParseOutcome::Exit(e.render().to_string())
                }
                ErrorKind::UnknownArgument => {
                    let token = match e.get(ContextKind::InvalidArg) {
                        Some(ContextValue::String(s)) => s.clone(),
                        _ => "?".to_string(),
                    };
                    ParseOutcome::Usage(format!("Unknown option: {}\n{}", token, usage()))
                }
                _ => ParseOutcome::Usage(format!("{}\n{}", e.render(), usage())),
            },
        }
    }
}

/// Full help text.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
