//! midispy - spy on a MIDI input port.
//!
//! Opens the chosen input port and logs every incoming message, optionally
//! relaying the stream verbatim to an output port. `--list` (or the `list`
//! subcommand) prints the port tables instead.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod errors;
mod format;
mod ports;
mod spy;
#[cfg(test)]
mod testing;

use crate::cli::{Cli, Parsed};
use crate::errors::SpyError;
use crate::ports::MidirBackend;

const CLIENT_NAME: &str = "midispy";

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = match cli::parse() {
        Ok(Parsed::Run(cli)) => cli,
        Ok(Parsed::Done) => return,
        Err(e) => exit_with(e.into()),
    };

    init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        exit_with(e);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let backend = MidirBackend::new(CLIENT_NAME)?;

    if cli.wants_listing() {
        ports::print_listing(&backend)?;
        return Ok(());
    }

    let config = cli.spy_config()?;
    let logger = format::logger(config.log, config.input, std::io::stdout());
    let session = spy::start(&backend, &config, logger)?;

    info!("press Ctrl-C to stop");
    session.wait(shutdown_signal()).await?;

    info!("done");
    Ok(())
}

/// Print the error and exit 1. Argument errors additionally get the input
/// port listing, so the user can see which indexes exist.
fn exit_with(err: anyhow::Error) -> ! {
    eprintln!("ERROR: {:#}", err);
    let is_argument = err
        .downcast_ref::<SpyError>()
        .map(SpyError::is_argument)
        .unwrap_or(false);
    if is_argument {
        print_input_diagnostic();
    }
    std::process::exit(1);
}

/// Best-effort input listing on stderr. Skipped silently when the driver
/// itself is unavailable.
fn print_input_diagnostic() {
    use crate::ports::MidiBackend;

    if let Ok(backend) = MidirBackend::new(CLIENT_NAME) {
        if let Ok(inputs) = backend.list_inputs() {
            eprint!("{}", ports::render_listing(ports::INPUT_BANNER, &inputs));
        }
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Diagnostics go to stderr; stdout carries only the message log.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl-C signal handler");
    info!("shutdown signal received");
}
