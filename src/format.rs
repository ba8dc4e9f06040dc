//! Console rendering of received messages.

use std::io::Write;

use crate::config::LogMode;

/// Format raw MIDI bytes as space-separated uppercase hex.
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One verbose log line: millisecond timestamp, source port, payload.
///
/// The timestamp comes from the driver in microseconds.
pub fn format_verbose(timestamp: u64, input_index: usize, data: &[u8]) -> String {
    format!(
        "[{:08}ms] in[{}] {} (len = {})",
        timestamp / 1000,
        input_index,
        format_hex(data),
        data.len()
    )
}

/// Build the per-message display callback for `mode` over `writer`.
///
/// Write failures are swallowed: a closed stdout must not take down the
/// relay path.
pub fn logger<W>(
    mode: LogMode,
    input_index: usize,
    mut writer: W,
) -> impl FnMut(u64, &[u8]) + Send + 'static
where
    W: Write + Send + 'static,
{
    move |timestamp, data| {
        let line = match mode {
            LogMode::Off => return,
            LogMode::Short => format_hex(data),
            LogMode::Verbose => format_verbose(timestamp, input_index, data),
        };
        let _ = writeln!(writer, "{}", line);
    }
}
