//! Scripted in-process modem for exercising a [`CommandInterface`] without
//! hardware.
//!
//! [`CommandInterface`]: crate::CommandInterface

use std::collections::VecDeque;
use std::io::Write;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use atlink_frame::LineReader;
use atlink_transport::StreamConnector;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

#[derive(Default)]
struct Script {
    replies: VecDeque<(String, String)>,
    received: Vec<String>,
}

#[derive(Default)]
struct Shared {
    script: Mutex<Script>,
    arrived: Condvar,
}

/// Far end of a stream pair that answers command lines from a script.
///
/// Each [`respond`](Self::respond) entry fires once, for the first received
/// line equal to its command; entries are matched in the order they were
/// added. Unscripted lines are recorded and left unanswered.
pub struct VirtualModem {
    stream: UnixStream,
    shared: Arc<Shared>,
    responder: Option<JoinHandle<()>>,
}

impl VirtualModem {
    /// Create a modem and the connector a command interface uses to reach it.
    pub fn new() -> std::io::Result<(Self, StreamConnector)> {
        let (host, device) = UnixStream::pair()?;
        let shared = Arc::new(Shared::default());

        let reader = LineReader::new(device.try_clone()?);
        let writer = device.try_clone()?;
        let responder = std::thread::Builder::new()
            .name("atlink-virtual-modem".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || answer(reader, writer, &shared)
            })?;

        let modem = Self {
            stream: device,
            shared,
            responder: Some(responder),
        };
        Ok((modem, StreamConnector::new(host)))
    }

    /// Reply with `reply` (raw bytes, terminators included) when `command`
    /// arrives.
    pub fn respond(&self, command: &str, reply: &str) {
        self.shared
            .script
            .lock()
            .replies
            .push_back((command.to_string(), reply.to_string()));
    }

    /// Write raw bytes to the host, e.g. an unsolicited result code.
    pub fn push(&self, bytes: &str) -> std::io::Result<()> {
        (&self.stream).write_all(bytes.as_bytes())
    }

    /// Every line received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.shared.script.lock().received.clone()
    }

    /// Wait until at least `count` lines have arrived or `timeout` elapses,
    /// then return what arrived.
    pub fn wait_for_commands(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        let mut script = self.shared.script.lock();
        while script.received.len() < count {
            if self.shared.arrived.wait_until(&mut script, deadline).timed_out() {
                break;
            }
        }
        script.received.clone()
    }

    /// Drop the line as if the module lost power.
    pub fn hang_up(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for VirtualModem {
    fn drop(&mut self) {
        self.hang_up();
        if let Some(responder) = self.responder.take() {
            let _ = responder.join();
        }
    }
}

fn answer(mut reader: LineReader<UnixStream>, mut writer: UnixStream, shared: &Shared) {
    while let Ok(line) = reader.read_line() {
        let reply = {
            let mut script = shared.script.lock();
            script.received.push(line.clone());
            shared.arrived.notify_all();
            script
                .replies
                .iter()
                .position(|(command, _)| *command == line)
                .and_then(|index| script.replies.remove(index))
                .map(|(_, reply)| reply)
        };

        if let Some(reply) = reply {
            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
    }
    debug!("virtual modem stopped");
}
