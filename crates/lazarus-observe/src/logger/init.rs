use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

pub(super) fn text(cfg: &LoggerConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .with_ansi(cfg.ansi)
        .with_target(cfg.targets)
        .with_span_events(span_events(cfg))
        .with_timer(timer());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

pub(super) fn json(cfg: &LoggerConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.targets)
        .with_current_span(true)
        .with_span_events(span_events(cfg))
        .with_timer(timer());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(all(target_os = "linux", feature = "journald"))]
pub(super) fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::Journald(e.to_string()))?
        .with_syslog_identifier("lazarus".to_string());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
pub(super) fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::Journald(
        "built without the journald feature or not on linux".to_string(),
    ))
}

pub(super) fn filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|e| LoggerError::BadFilter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

fn span_events(cfg: &LoggerConfig) -> FmtSpan {
    if cfg.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

// Local offset lookup fails in multi-threaded processes on some platforms;
// fall back to UTC rather than refuse to log.
fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        if msg.contains("SetGlobalDefaultError") || msg.contains("global default") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::Install(msg)
        }
    })
}
