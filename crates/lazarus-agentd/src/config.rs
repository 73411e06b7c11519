use std::{net::SocketAddr, time::Duration};

use clap::{Parser, ValueEnum};
use lazarus_core::{CleanerConfig, ConfigError, HeartbeatConfig, WorkerConfig};
use lazarus_observe::{LoggerConfig, LoggerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Claim and execute tasks.
    Worker,
    /// Reclaim the queues of dead workers.
    Cleaner,
}

/// Reliable task queue agent over Redis.
#[derive(Debug, Parser)]
#[command(name = "lazarus-agentd", version, about)]
pub struct AgentConfig {
    #[arg(long, env = "LAZARUS_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Prefix shared by every key of one queue deployment.
    #[arg(long, env = "LAZARUS_PREFIX", default_value = "async")]
    pub prefix: String,

    /// Defaults to the container id or hostname plus a random suffix.
    #[arg(long, env = "LAZARUS_WORKER_ID")]
    pub worker_id: Option<String>,

    #[arg(
        long,
        env = "LAZARUS_ROLES",
        value_enum,
        value_delimiter = ',',
        default_value = "worker,cleaner"
    )]
    pub roles: Vec<Role>,

    #[arg(long, env = "LAZARUS_HEARTBEAT_INTERVAL_MS", default_value_t = 10_000)]
    pub heartbeat_interval_ms: u64,

    #[arg(long, env = "LAZARUS_HEARTBEAT_TTL_MS", default_value_t = 30_000)]
    pub heartbeat_ttl_ms: u64,

    #[arg(long, env = "LAZARUS_CLEANER_INTERVAL_MS", default_value_t = 20_000)]
    pub cleaner_interval_ms: u64,

    #[arg(long, env = "LAZARUS_POLL_INTERVAL_MS", default_value_t = 1_000)]
    pub poll_interval_ms: u64,

    #[arg(long, env = "LAZARUS_MAX_WATCHED", default_value_t = 100)]
    pub max_watched: usize,

    #[arg(long, env = "LAZARUS_MAX_REJECTIONS", default_value_t = 10)]
    pub max_rejections: u32,

    /// text | json | journald
    #[arg(long, env = "LAZARUS_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// `EnvFilter` directive.
    #[arg(long, env = "LAZARUS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log every closing instrumented span with its busy time.
    #[arg(long, env = "LAZARUS_LOG_SPAN_TIMINGS")]
    pub log_span_timings: bool,

    /// Address of the `/healthz` and `/metrics` endpoints.
    #[arg(long, env = "LAZARUS_HTTP_LISTEN", default_value = "0.0.0.0:9464")]
    pub http_listen: SocketAddr,
}

impl AgentConfig {
    pub fn runs(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn heartbeat(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            interval: Duration::from_millis(self.heartbeat_interval_ms),
            ttl: Duration::from_millis(self.heartbeat_ttl_ms),
        }
    }

    pub fn cleaner(&self) -> CleanerConfig {
        CleanerConfig {
            interval: Duration::from_millis(self.cleaner_interval_ms),
        }
    }

    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_watched: self.max_watched,
            max_rejections: self.max_rejections,
        }
    }

    pub fn logger(&self) -> Result<LoggerConfig, LoggerError> {
        let format = self.log_format.parse()?;
        Ok(LoggerConfig::new(format, self.log_level.clone())
            .with_span_timings(self.log_span_timings))
    }

    /// The TTL check runs even for a cleaner-only agent: it has to agree
    /// with the workers it sweeps after.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.heartbeat().validate(&self.cleaner())?;
        self.worker().validate()
    }
}
