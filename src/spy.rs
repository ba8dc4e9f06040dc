//! The spy loop: subscribe to an input port, relay, log, wait.

use tokio::sync::mpsc;
use tracing::info;

use crate::config::SpyConfig;
use crate::errors::{Result, SpyError};
use crate::ports::{InputPort, MidiBackend};

/// A running spy session. Dropping it closes every open port.
pub struct SpySession {
    fatal_rx: mpsc::Receiver<SpyError>,
    // Held for its Drop; the relay output lives inside the input callback.
    _input: Box<dyn InputPort>,
}

/// Open the configured ports and start spying.
///
/// `on_message` runs on the driver's listener thread for every received
/// message, after the optional relay step. Messages are relayed verbatim
/// and in arrival order; a relay failure stops the session through
/// [`SpySession::wait`].
pub fn start(
    backend: &dyn MidiBackend,
    config: &SpyConfig,
    mut on_message: impl FnMut(u64, &[u8]) + Send + 'static,
) -> Result<SpySession> {
    // Capacity 1 is enough: the first relay failure ends the process.
    let (fatal_tx, fatal_rx) = mpsc::channel(1);

    let mut output = match config.output {
        Some(index) => Some(backend.open_output(index)?),
        None => None,
    };

    let input = backend.open_input(
        config.input,
        Box::new(move |timestamp, data| {
            // Relay first; logging must not delay or mask forwarding.
            if let Some(out) = output.as_mut() {
                if let Err(e) = out.send(data) {
                    let _ = fatal_tx.try_send(e);
                    return;
                }
            }
            on_message(timestamp, data);
        }),
    )?;

    info!("spying on input port {}", config.input);
    if let Some(index) = config.output {
        info!("relaying to output port {}", index);
    }

    Ok(SpySession {
        fatal_rx,
        _input: input,
    })
}

impl SpySession {
    /// Block until `shutdown` completes or a relay failure arrives, then
    /// drop the session, closing the input port and the relay output.
    pub async fn wait(mut self, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        tokio::select! {
            _ = &mut shutdown => {
                info!("interrupt received, closing ports");
                Ok(())
            }
            Some(err) = self.fatal_rx.recv() => Err(err),
        }
    }
}
