use std::time::Duration;

use atlink_frame::DEFAULT_MAX_LINE;

/// Default time to wait for each response line.
pub const DEFAULT_LINE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the output and command queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Runtime configuration of a command interface.
///
/// Fixed at construction; `start` snapshots it.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// How long `transact` waits for the next line before giving up.
    pub line_timeout: Duration,
    /// Framed lines buffered between the reader worker and `transact`.
    pub output_capacity: usize,
    /// Outgoing lines buffered between callers and the writer worker.
    pub command_capacity: usize,
    /// Transport read timeout; bounds how long the reader takes to notice `close`.
    pub poll_interval: Duration,
    /// Longest line the framer accepts before declaring the link broken.
    pub max_line_length: usize,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            line_timeout: DEFAULT_LINE_TIMEOUT,
            output_capacity: DEFAULT_QUEUE_CAPACITY,
            command_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: Duration::from_millis(100),
            max_line_length: DEFAULT_MAX_LINE,
        }
    }
}

impl ModemConfig {
    /// Default configuration with a different line timeout.
    pub fn with_line_timeout(line_timeout: Duration) -> Self {
        Self {
            line_timeout,
            ..Self::default()
        }
    }
}
