//! MIDI driver access: port discovery and connection handling.
//!
//! Everything the rest of the crate knows about the platform MIDI driver
//! goes through [`MidiBackend`], so the spy loop and the tests never touch
//! `midir` directly.

use colored::*;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::debug;

use crate::errors::{PortDirection, Result, SpyError};

pub const INPUT_BANNER: &str = "--- MIDI input ports ---";
pub const OUTPUT_BANNER: &str = "--- MIDI output ports ---";

/// One discoverable MIDI endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
}

/// Callback invoked on the driver's listener thread for every received
/// message, with the driver timestamp (microseconds) and the raw bytes.
pub type InputCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// An open input connection. Dropping it closes the port and stops the
/// callback.
pub trait InputPort: Send {}

/// An open output connection. Dropping it closes the port.
pub trait OutputPort: Send {
    /// Send one message verbatim.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}

/// Access to the platform MIDI driver.
pub trait MidiBackend {
    /// Input ports in driver order.
    fn list_inputs(&self) -> Result<Vec<PortInfo>>;

    /// Output ports in driver order.
    fn list_outputs(&self) -> Result<Vec<PortInfo>>;

    /// Connect to the input port at `index` and start delivering every
    /// message category to `callback`.
    fn open_input(&self, index: usize, callback: InputCallback) -> Result<Box<dyn InputPort>>;

    /// Connect to the output port at `index`.
    fn open_output(&self, index: usize) -> Result<Box<dyn OutputPort>>;
}

/// `midir`-backed implementation. Each operation creates a fresh client
/// handle; connecting consumes the handle, so there is nothing to share.
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    /// Probe the system MIDI subsystem once. Fails with
    /// [`SpyError::DriverInit`] when no driver is available at all.
    pub fn new(client_name: &str) -> Result<Self> {
        let _probe = MidiInput::new(client_name)?;
        Ok(Self {
            client_name: client_name.to_string(),
        })
    }

    fn input_handle(&self) -> Result<MidiInput> {
        let mut input = MidiInput::new(&self.client_name)?;
        input.ignore(Ignore::None);
        Ok(input)
    }
}

impl MidiBackend for MidirBackend {
    fn list_inputs(&self) -> Result<Vec<PortInfo>> {
        let input = self.input_handle()?;
        let ports = input
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| PortInfo {
                index,
                name: input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("port {}", index)),
            })
            .collect::<Vec<_>>();
        debug!("found {} input ports", ports.len());
        Ok(ports)
    }

    fn list_outputs(&self) -> Result<Vec<PortInfo>> {
        let output = MidiOutput::new(&self.client_name)?;
        let ports = output
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| PortInfo {
                index,
                name: output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("port {}", index)),
            })
            .collect::<Vec<_>>();
        debug!("found {} output ports", ports.len());
        Ok(ports)
    }

    fn open_input(&self, index: usize, mut callback: InputCallback) -> Result<Box<dyn InputPort>> {
        let input = self.input_handle()?;
        let ports = input.ports();
        let available = ports.len();
        let port = ports
            .into_iter()
            .nth(index)
            .ok_or_else(|| SpyError::PortOpen {
                direction: PortDirection::Input,
                index,
                available,
                reason: "no such port".to_string(),
            })?;
        let conn_name = format!("{}-in", self.client_name);
        let conn = input
            .connect(
                &port,
                &conn_name,
                move |timestamp, data, _| callback(timestamp, data),
                (),
            )
            .map_err(|e| SpyError::PortOpen {
                direction: PortDirection::Input,
                index,
                available,
                reason: e.to_string(),
            })?;
        Ok(Box::new(MidirInput { _conn: conn }))
    }

    fn open_output(&self, index: usize) -> Result<Box<dyn OutputPort>> {
        let output = MidiOutput::new(&self.client_name)?;
        let ports = output.ports();
        let available = ports.len();
        let port = ports
            .into_iter()
            .nth(index)
            .ok_or_else(|| SpyError::PortOpen {
                direction: PortDirection::Output,
                index,
                available,
                reason: "no such port".to_string(),
            })?;
        let conn_name = format!("{}-out", self.client_name);
        let conn = output
            .connect(&port, &conn_name)
            .map_err(|e| SpyError::PortOpen {
                direction: PortDirection::Output,
                index,
                available,
                reason: e.to_string(),
            })?;
        Ok(Box::new(MidirOutput { conn }))
    }
}

struct MidirInput {
    // Held for its Drop: disconnecting closes the port.
    _conn: MidiInputConnection<()>,
}

impl InputPort for MidirInput {}

struct MidirOutput {
    conn: MidiOutputConnection,
}

impl OutputPort for MidirOutput {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.conn
            .send(data)
            .map_err(|e| SpyError::Relay(e.to_string()))
    }
}

/// Plain one-direction listing: banner line, then `[index] name` entries.
pub fn render_listing(banner: &str, ports: &[PortInfo]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "\n{}\n", banner);
    if ports.is_empty() {
        let _ = writeln!(out, "  (none found)");
    } else {
        for port in ports {
            let _ = writeln!(out, "  [{}] {}", port.index, port.name);
        }
    }
    out
}

/// Print input and output listings to stdout with colored banners.
pub fn print_listing(backend: &dyn MidiBackend) -> Result<()> {
    let inputs = backend.list_inputs()?;
    let outputs = backend.list_outputs()?;
    print_ports(INPUT_BANNER, &inputs);
    print_ports(OUTPUT_BANNER, &outputs);
    Ok(())
}

fn print_ports(banner: &str, ports: &[PortInfo]) {
    println!("\n{}\n", banner.bold().cyan());
    if ports.is_empty() {
        println!("{}", "  (none found)".dimmed());
        return;
    }
    for port in ports {
        println!("  [{}] {}", port.index, port.name);
    }
}
