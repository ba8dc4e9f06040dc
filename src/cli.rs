//! Command-line surface.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::config::{LogMode, SpyConfig};
use crate::errors::{Result, SpyError};

/// Spy on a MIDI input port: log every message and optionally relay the
/// stream verbatim to an output port.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input port index to spy on
    #[arg(short = 'i', long = "device", value_name = "PORT")]
    pub device: Option<usize>,

    /// Relay every received message to this output port
    #[arg(short, long, value_name = "PORT")]
    pub output: Option<usize>,

    /// Do not log received messages
    #[arg(short, long)]
    pub nolog: bool,

    /// Log the raw bytes only, without timestamps
    #[arg(short, long)]
    pub short: bool,

    /// List available MIDI ports and exit
    #[arg(long)]
    pub list: bool,

    /// Log level for diagnostics (error, warn, info, debug, trace)
    #[arg(long, env = "MIDISPY_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available MIDI ports and exit
    List,
}

impl Cli {
    /// True when either listing spelling was used.
    pub fn wants_listing(&self) -> bool {
        self.list || matches!(self.command, Some(Command::List))
    }

    /// Resolve the spy-mode settings, validating required arguments.
    pub fn spy_config(&self) -> Result<SpyConfig> {
        let input = self.device.ok_or_else(|| {
            SpyError::Argument("missing required argument: --device <PORT>".to_string())
        })?;
        Ok(SpyConfig {
            input,
            output: self.output,
            log: LogMode::from_flags(self.nolog, self.short),
        })
    }
}

/// Outcome of argument parsing once help and version are accounted for.
pub enum Parsed {
    /// Normal run with parsed arguments.
    Run(Cli),
    /// Help or version was printed; nothing left to do.
    Done,
}

/// Parse `std::env::args`, keeping the exit-code contract: help and
/// version go to stdout and exit 0, every other parse failure becomes an
/// argument error (exit 1) instead of clap's code-2 path.
pub fn parse() -> Result<Parsed> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Parsed>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Parsed::Run(cli)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // clap routes these to stdout itself.
            let _ = e.print();
            Ok(Parsed::Done)
        }
        Err(e) => Err(SpyError::Argument(first_line(&e.to_string()))),
    }
}

/// First line of a clap rendering, without the `error: ` prefix. The port
/// listing printed after an argument error replaces the usage block.
fn first_line(rendered: &str) -> String {
    let line = rendered.lines().next().unwrap_or(rendered);
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}
