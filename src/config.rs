//! Runtime configuration for a spy session.
//!
//! Everything is resolved from the command line once at startup; nothing in
//! here changes for the lifetime of the process.

/// How received messages are written to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Timestamped line with source port index and payload length.
    #[default]
    Verbose,
    /// Raw bytes only, space-separated uppercase hex.
    Short,
    /// No per-message output. Relaying is unaffected.
    Off,
}

impl LogMode {
    /// Resolve the two logging flags. `--nolog` wins over `--short`.
    pub fn from_flags(nolog: bool, short: bool) -> Self {
        if nolog {
            LogMode::Off
        } else if short {
            LogMode::Short
        } else {
            LogMode::Verbose
        }
    }
}

/// Settings for one spy session.
#[derive(Debug, Clone)]
pub struct SpyConfig {
    /// Input port index to listen on.
    pub input: usize,
    /// Output port index to relay to, if any.
    pub output: Option<usize>,
    /// Console logging style.
    pub log: LogMode,
}
