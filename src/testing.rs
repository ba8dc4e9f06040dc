//! In-memory test doubles for the driver seam.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{PortDirection, Result, SpyError};
use crate::ports::{InputCallback, InputPort, MidiBackend, OutputPort, PortInfo};

/// Scripted backend: fixed port tables, recorded sends, and a hook to
/// inject messages into the open input callback.
#[derive(Default)]
pub struct MockBackend {
    inputs: Vec<PortInfo>,
    outputs: Vec<PortInfo>,
    state: Arc<MockState>,
}

/// Observable state shared between a [`MockBackend`] and its open ports.
#[derive(Default)]
pub struct MockState {
    sent: Mutex<Vec<Vec<u8>>>,
    open_ports: AtomicUsize,
    callback: Mutex<Option<InputCallback>>,
    send_budget: Mutex<Option<usize>>,
}

impl MockState {
    /// Every payload sent to the open output, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of currently open port handles.
    pub fn open_ports(&self) -> usize {
        self.open_ports.load(Ordering::SeqCst)
    }
}

impl MockBackend {
    /// Backend with the given `(index, name)` port tables.
    pub fn with_ports(inputs: &[(usize, &str)], outputs: &[(usize, &str)]) -> Self {
        fn to_infos(ports: &[(usize, &str)]) -> Vec<PortInfo> {
            ports
                .iter()
                .map(|(index, name)| PortInfo {
                    index: *index,
                    name: (*name).to_string(),
                })
                .collect()
        }
        Self {
            inputs: to_infos(inputs),
            outputs: to_infos(outputs),
            state: Arc::default(),
        }
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.sent()
    }

    pub fn open_ports(&self) -> usize {
        self.state.open_ports()
    }

    /// Let `n` more sends succeed, then fail every send after them.
    pub fn fail_sends_after(&self, n: usize) {
        *self.state.send_budget.lock().unwrap() = Some(n);
    }

    /// Drive the open input callback the way the listener thread would.
    ///
    /// Panics when no input port is open; that is a harness bug.
    pub fn inject(&self, timestamp: u64, data: &[u8]) {
        let mut callback = self.state.callback.lock().unwrap();
        match callback.as_mut() {
            Some(cb) => cb(timestamp, data),
            None => panic!("inject with no open input port"),
        }
    }
}

impl MidiBackend for MockBackend {
    fn list_inputs(&self) -> Result<Vec<PortInfo>> {
        Ok(self.inputs.clone())
    }

    fn list_outputs(&self) -> Result<Vec<PortInfo>> {
        Ok(self.outputs.clone())
    }

    fn open_input(&self, index: usize, callback: InputCallback) -> Result<Box<dyn InputPort>> {
        if !self.inputs.iter().any(|p| p.index == index) {
            return Err(SpyError::PortOpen {
                direction: PortDirection::Input,
                index,
                available: self.inputs.len(),
                reason: "no such port".to_string(),
            });
        }
        *self.state.callback.lock().unwrap() = Some(callback);
        self.state.open_ports.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockInput {
            state: Arc::clone(&self.state),
        }))
    }

    fn open_output(&self, index: usize) -> Result<Box<dyn OutputPort>> {
        if !self.outputs.iter().any(|p| p.index == index) {
            return Err(SpyError::PortOpen {
                direction: PortDirection::Output,
                index,
                available: self.outputs.len(),
                reason: "no such port".to_string(),
            });
        }
        self.state.open_ports.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockOutput {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockInput {
    state: Arc<MockState>,
}

impl InputPort for MockInput {}

impl Drop for MockInput {
    fn drop(&mut self) {
        // Mirrors the real driver: closing the input stops the callback,
        // which owns the relay output.
        *self.state.callback.lock().unwrap() = None;
        self.state.open_ports.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockOutput {
    state: Arc<MockState>,
}

impl OutputPort for MockOutput {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut budget = self.state.send_budget.lock().unwrap();
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(SpyError::Relay("output device gone".to_string()));
            }
            *remaining -= 1;
        }
        drop(budget);
        self.state.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        self.state.open_ports.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cloneable in-memory `Write` sink for asserting on logger output.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
