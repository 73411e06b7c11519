use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}; use text, json or journald")]
    UnknownFormat(String),

    #[error("bad log filter {directive:?}: {reason}")]
    BadFilter { directive: String, reason: String },

    /// A subscriber was installed earlier in this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("journald output unavailable: {0}")]
    Journald(String),

    #[error("cannot install tracing subscriber: {0}")]
    Install(String),
}
