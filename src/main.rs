//! tasksync CLI entry point.
//!
//! Initializes logging, runs one invocation and maps failure to a non-zero
//! exit code.

use std::process::ExitCode;

use anyhow::Context;
use tasksync::{ApiCatalog, Session, TaskSyncError, TerminalPrompter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    init_tracing(&argv);

    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!();
            eprintln!("Failed - {err:#}");
            if let Some(hint) = err.downcast_ref::<TaskSyncError>().and_then(TaskSyncError::hint) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(argv: &[String]) -> anyhow::Result<()> {
    let catalog = ApiCatalog::bundled().context("failed to load the bundled API catalog")?;
    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;

    let mut prompter = TerminalPrompter;
    let mut stdout = std::io::stdout().lock();
    Session::new(&catalog, cwd, &mut prompter, &mut stdout).run(argv)?;
    Ok(())
}

fn init_tracing(argv: &[String]) {
    // Priority: RUST_LOG env var > --log-level CLI arg > default "warn"
    let level = tasksync::cli::log_level_arg(argv).unwrap_or_else(|| "warn".to_string());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}
