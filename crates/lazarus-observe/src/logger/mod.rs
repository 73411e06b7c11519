mod config;
mod error;
mod format;
mod init;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the process-wide tracing subscriber.
///
/// Succeeds once per process; later calls report
/// [`LoggerError::AlreadyInitialized`] and leave the first subscriber active.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = init::filter(&cfg.filter)?;
    match cfg.format {
        LoggerFormat::Text => init::text(cfg, filter),
        LoggerFormat::Json => init::json(cfg, filter),
        LoggerFormat::Journald => init::journald(filter),
    }
}
