use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Transcripts are emitted at info; `--debug` must not be filtered away.
    pub fn with_transcripts(self, debug: bool) -> Self {
        if debug {
            self.max(LogLevel::Info)
        } else {
            self
        }
    }
}

/// Install the stderr subscriber. Transcript lines from the modem crates
/// land here.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_thread_names(matches!(level, LogLevel::Debug | LogLevel::Trace))
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_quiet_levels_to_info() {
        assert_eq!(LogLevel::Error.with_transcripts(true), LogLevel::Info);
        assert_eq!(LogLevel::Trace.with_transcripts(true), LogLevel::Trace);
        assert_eq!(LogLevel::Warn.with_transcripts(false), LogLevel::Warn);
    }
}
