use clap::Parser;
use stack_runner::cli::{execute, Cli};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // logs go to stderr, stdout only carries scripts and confirmations
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match execute(Cli::parse()) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                "{} of {} submissions failed",
                report.failed(),
                report.batches.len()
            );

            ExitCode::FAILURE
        }
        Err(error) => {
            error!("{error}");

            ExitCode::FAILURE
        }
    }
}
