//! vmreset - main entry point

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use vmreset::cli::{Cli, ParseOutcome};
use vmreset::{process_guard, sanity, CleanupConfig, RunOptions, SystemRunner, VmResetError};

/// Initialize the logger. Logs go to stderr; `RUST_LOG` overrides the level.
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> vmreset::Result<CleanupConfig> {
    let config = match &cli.config {
        Some(path) => CleanupConfig::load_from_file(path)?,
        None => CleanupConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = match Cli::parse_args() {
        ParseOutcome::Run(cli) => cli,
        ParseOutcome::Exit(text) => {
            print!("{}", text);
            return ExitCode::SUCCESS;
        }
        ParseOutcome::Usage(text) => {
            eprint!("{}", text);
            return ExitCode::FAILURE;
        }
    };

    init_logger();

    if let Err(e) = process_guard::init_signal_handlers() {
        // Children still die with us via PR_SET_PDEATHSIG
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let result = load_config(&cli).and_then(|config| {
        vmreset::run_cleanup(
            RunOptions::from(&cli),
            &config,
            SystemRunner::new(),
            &mut io::stdin().lock(),
            io::stdout(),
            || sanity::verify_environment().into_result(),
        )
    });

    match result {
        Ok(summary) => {
            debug!("Cleanup summary: {:?}", summary);
            ExitCode::SUCCESS
        }
        Err(VmResetError::Aborted) => {
            println!();
            println!("Aborted.");
            exit_code(&VmResetError::Aborted)
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("vmreset: {}", e);
            exit_code(&e)
        }
    }
}

fn exit_code(err: &VmResetError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
