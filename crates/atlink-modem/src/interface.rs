use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use atlink_frame::{Line, LineConfig, LineReader, LineWriter};
use atlink_transport::{Connector, LinkStream, SerialConnector};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::transcript::Transcript;
use crate::vocabulary::{Terminal, Vocabulary};
use crate::worker::{spawn_reader, spawn_writer, LinkHealth};

type OutputObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Line-oriented command interface to one cellular module.
///
/// Owns the link, a reader worker framing incoming bytes into lines and a
/// writer worker sending command lines. Callers drive it with
/// [`transact`](Self::transact); at most one transaction runs at a time.
///
/// # Example
///
/// ```no_run
/// use atlink_modem::CommandInterface;
///
/// let mut modem = CommandInterface::serial("/dev/ttyUSB0", 115_200);
/// modem.add_success_token("SEND OK")?;
/// modem.start()?;
///
/// let mut imsi = String::new();
/// modem.transact_with("AT+CIMI", |line| {
///     imsi = line.to_string();
///     Ok(())
/// })?;
/// modem.close();
/// # Ok::<(), atlink_modem::ModemError>(())
/// ```
pub struct CommandInterface {
    connector: Box<dyn Connector>,
    config: ModemConfig,
    vocabulary: Vocabulary,
    debug: AtomicBool,
    observer: Option<OutputObserver>,
    link: Option<RunningLink>,
}

struct RunningLink {
    // Held for the whole of a transaction.
    output: Mutex<Receiver<Line>>,
    commands: Sender<String>,
    shutdown: Sender<()>,
    stream: Mutex<LinkStream>,
    health: Arc<LinkHealth>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl CommandInterface {
    /// Create an interface over `connector` with default configuration.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_config(connector, ModemConfig::default())
    }

    /// Create an interface over `connector` with explicit configuration.
    pub fn with_config(connector: impl Connector + 'static, config: ModemConfig) -> Self {
        Self {
            connector: Box::new(connector),
            config,
            vocabulary: Vocabulary::default(),
            debug: AtomicBool::new(false),
            observer: None,
            link: None,
        }
    }

    /// Create an interface over a serial device (8N1, no flow control).
    pub fn serial(device: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(SerialConnector::new(device, baud_rate))
    }

    /// Open the link and launch the reader and writer workers.
    pub fn start(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Err(ModemError::AlreadyStarted);
        }

        let target = self.connector.describe();
        let stream = self.connector.connect()?;
        let writer_stream = stream.try_clone()?;
        let reader_stream = stream.try_clone()?;

        let line_config = LineConfig {
            delimiters: self.vocabulary.delimiters().clone(),
            max_line_length: self.config.max_line_length,
            read_timeout: Some(self.config.poll_interval),
        };
        let reader = LineReader::for_link(reader_stream, line_config)?;
        let writer = LineWriter::new(writer_stream);

        let (output_tx, output_rx) = bounded(self.config.output_capacity);
        let (command_tx, command_rx) = bounded(self.config.command_capacity);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let health = Arc::new(LinkHealth::default());

        let reader = spawn_reader(reader, output_tx, shutdown_rx.clone(), Arc::clone(&health))?;
        let writer = match spawn_writer(writer, command_rx, shutdown_rx, Arc::clone(&health)) {
            Ok(handle) => handle,
            Err(err) => {
                drop(shutdown_tx);
                let _ = stream.shutdown();
                let _ = reader.join();
                return Err(err);
            }
        };

        debug!(target = %target, "command interface started");
        self.link = Some(RunningLink {
            output: Mutex::new(output_rx),
            commands: command_tx,
            shutdown: shutdown_tx,
            stream: Mutex::new(stream),
            health,
            reader,
            writer,
        });
        Ok(())
    }

    /// Stop both workers and release the link. Safe to call repeatedly.
    pub fn close(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };

        let RunningLink {
            output,
            commands,
            shutdown,
            stream,
            reader,
            writer,
            ..
        } = link;

        drop(shutdown);
        drop(commands);
        if let Err(err) = stream.lock().shutdown() {
            debug!(error = %err, "link shutdown failed");
        }
        if reader.join().is_err() {
            warn!("line reader panicked");
        }
        if writer.join().is_err() {
            warn!("line writer panicked");
        }
        drop(output);
        debug!(target = %self.connector.describe(), "command interface closed");
    }

    /// Toggle debug transcripts. May be changed at any time.
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Whether `start` has run and `close` has not.
    pub fn is_started(&self) -> bool {
        self.link.is_some()
    }

    /// Reason the link died, if a worker has failed.
    pub fn link_failure(&self) -> Option<String> {
        self.link.as_ref().and_then(|link| link.health.failure())
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Add a token that ends a transaction successfully.
    pub fn add_success_token(&mut self, token: &str) -> Result<()> {
        self.ensure_stopped()?;
        self.vocabulary.add_success(token)?;
        Ok(())
    }

    /// Add a token that ends a transaction with [`ModemError::CommandFailed`].
    pub fn add_error_token(&mut self, token: &str) -> Result<()> {
        self.ensure_stopped()?;
        self.vocabulary.add_error(token)?;
        Ok(())
    }

    /// Add a line delimiter, e.g. a `">"` data prompt.
    pub fn add_delimiter(&mut self, delimiter: &str) -> Result<()> {
        self.ensure_stopped()?;
        self.vocabulary.add_delimiter(delimiter)?;
        Ok(())
    }

    /// Observe every drained line and every non-terminal response line.
    pub fn on_output(&mut self, observer: impl Fn(&str) + Send + Sync + 'static) -> Result<()> {
        self.ensure_stopped()?;
        self.observer = Some(Arc::new(observer));
        Ok(())
    }

    /// Run one transaction, ignoring intermediate response lines.
    pub fn transact(&self, command: &str) -> Result<()> {
        self.transact_with(command, |_| Ok(()))
    }

    /// Send `command` and feed each non-terminal response line to `on_line`
    /// until a success or error token, a callback failure or a line timeout.
    ///
    /// Lines queued before the call are drained and never reach `on_line`.
    /// Concurrent callers are serialized. `on_line` may call
    /// [`send_raw`](Self::send_raw) but must not call `transact`.
    pub fn transact_with<F>(&self, command: &str, mut on_line: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        self.transact_lines(command, |line| on_line(&line.text))
    }

    /// Like [`transact_with`](Self::transact_with), but the callback also
    /// sees which delimiter ended each line, so a `">"` prompt can be told
    /// apart from a blank line.
    pub fn transact_lines<F>(&self, command: &str, mut on_line: F) -> Result<()>
    where
        F: FnMut(&Line) -> Result<()>,
    {
        let link = self.running()?;
        let output = link.output.lock();

        if let Some(reason) = link.health.failure() {
            return Err(ModemError::LinkFailed(reason));
        }

        while let Ok(stale) = output.try_recv() {
            self.consume(&stale.text);
        }

        let debug = self.is_debug();
        let mut transcript = Transcript::new();
        self.enqueue(link, command)?;
        transcript.sent(command);

        loop {
            let line = match output.recv_timeout(self.config.line_timeout) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => {
                    if debug {
                        transcript.log_debug();
                    }
                    return Err(match link.health.failure() {
                        Some(reason) => ModemError::LinkFailed(reason),
                        None => ModemError::Timeout(self.config.line_timeout),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if debug {
                        transcript.log_debug();
                    }
                    return Err(disconnected(link));
                }
            };

            transcript.received(&line.text);
            match self.vocabulary.classify(&line.text) {
                Some(Terminal::Error) => {
                    transcript.log_failure();
                    return Err(ModemError::CommandFailed {
                        command: command.to_string(),
                        token: line.text,
                    });
                }
                Some(Terminal::Success) => {
                    if debug {
                        transcript.log_debug();
                    }
                    return Ok(());
                }
                None => {}
            }

            self.consume(&line.text);
            if let Err(err) = on_line(&line) {
                if debug {
                    transcript.log_debug();
                }
                return Err(err);
            }
        }
    }

    /// Queue `line` for the writer without waiting for a response.
    pub fn send_raw(&self, line: &str) -> Result<()> {
        let link = self.running()?;
        if let Some(reason) = link.health.failure() {
            return Err(ModemError::LinkFailed(reason));
        }
        if self.is_debug() {
            info!("[raw] > {line}");
        }
        self.enqueue(link, line)
    }

    fn running(&self) -> Result<&RunningLink> {
        self.link.as_ref().ok_or(ModemError::NotStarted)
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.link.is_some() {
            return Err(ModemError::AlreadyStarted);
        }
        Ok(())
    }

    fn enqueue(&self, link: &RunningLink, line: &str) -> Result<()> {
        match link.commands.send_timeout(line.to_string(), self.config.line_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(ModemError::Timeout(self.config.line_timeout)),
            Err(SendTimeoutError::Disconnected(_)) => Err(disconnected(link)),
        }
    }

    fn consume(&self, line: &str) {
        match &self.observer {
            Some(observer) => observer(line),
            None if self.is_debug() => debug!("CONSUME {line}"),
            None => {}
        }
    }
}

fn disconnected(link: &RunningLink) -> ModemError {
    match link.health.failure() {
        Some(reason) => ModemError::LinkFailed(reason),
        None => ModemError::Closed,
    }
}

impl Drop for CommandInterface {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CommandInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInterface")
            .field("target", &self.connector.describe())
            .field("config", &self.config)
            .field("vocabulary", &self.vocabulary)
            .field("started", &self.is_started())
            .finish()
    }
}
