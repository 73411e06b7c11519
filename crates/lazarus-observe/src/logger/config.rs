use std::io::IsTerminal;

use crate::logger::format::LoggerFormat;

/// Output settings for [`logger_init`](crate::logger_init).
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `lazarus_core=debug,info`.
    pub filter: String,
    pub targets: bool,
    /// Colored output. Only honoured by the text format.
    pub ansi: bool,
    /// Log each closing `#[instrument]` span with its busy time.
    pub span_timings: bool,
}

impl LoggerConfig {
    pub fn new(format: LoggerFormat, filter: impl Into<String>) -> Self {
        Self {
            format,
            filter: filter.into(),
            targets: true,
            ansi: std::io::stdout().is_terminal(),
            span_timings: false,
        }
    }

    pub fn with_span_timings(mut self, on: bool) -> Self {
        self.span_timings = on;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(LoggerFormat::Text, "info")
    }
}
