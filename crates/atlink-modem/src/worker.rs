//! Reader and writer threads behind a command interface.

use std::io::ErrorKind;
use std::thread::JoinHandle;

use atlink_frame::{FrameError, Line, LineReader, LineWriter};
use atlink_transport::LinkStream;
use crossbeam_channel::{select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{ModemError, Result};

/// First fatal failure recorded by either worker.
#[derive(Debug, Default)]
pub(crate) struct LinkHealth {
    failure: Mutex<Option<String>>,
}

impl LinkHealth {
    pub(crate) fn fail(&self, reason: String) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(reason);
        }
    }

    pub(crate) fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }
}

fn shutdown_requested(shutdown: &Receiver<()>) -> bool {
    matches!(shutdown.try_recv(), Err(TryRecvError::Disconnected))
}

/// Frame lines off the link and push them onto the output queue until
/// shutdown or a fatal read error.
pub(crate) fn spawn_reader(
    mut reader: LineReader<LinkStream>,
    output: Sender<Line>,
    shutdown: Receiver<()>,
    health: std::sync::Arc<LinkHealth>,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("atlink-reader".to_string())
        .spawn(move || loop {
            if shutdown_requested(&shutdown) {
                debug!("terminating line reader");
                return;
            }

            let line = match reader.read_terminated() {
                Ok(line) => line,
                Err(FrameError::Io(err))
                    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
                {
                    continue;
                }
                Err(err) => {
                    if shutdown_requested(&shutdown) {
                        debug!("terminating line reader");
                    } else {
                        error!(error = %err, "line reader failed");
                        health.fail(format!("read failed: {err}"));
                    }
                    return;
                }
            };

            // Blocks while the queue is full; close still gets through.
            select! {
                send(output, line) -> sent => {
                    if sent.is_err() {
                        return;
                    }
                }
                recv(shutdown) -> _ => {
                    debug!("terminating line reader");
                    return;
                }
            }
        })
        .map_err(ModemError::Spawn)
}

/// Write queued command lines to the link in order until shutdown or a
/// fatal write error.
pub(crate) fn spawn_writer(
    mut writer: LineWriter<LinkStream>,
    commands: Receiver<String>,
    shutdown: Receiver<()>,
    health: std::sync::Arc<LinkHealth>,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("atlink-writer".to_string())
        .spawn(move || loop {
            select! {
                recv(commands) -> line => {
                    let Ok(line) = line else {
                        return;
                    };
                    if let Err(err) = writer.write_line(&line) {
                        error!(error = %err, "line writer failed");
                        health.fail(format!("write failed: {err}"));
                        return;
                    }
                }
                recv(shutdown) -> _ => {
                    debug!("terminating line writer");
                    return;
                }
            }
        })
        .map_err(ModemError::Spawn)
}
