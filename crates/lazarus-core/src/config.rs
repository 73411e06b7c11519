use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("heartbeat ttl ({ttl:?}) must exceed {name} ({interval:?})")]
    TtlTooShort {
        ttl: Duration,
        name: &'static str,
        interval: Duration,
    },
}

/// Liveness key settings shared by every worker of a fleet.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// How often a live worker rewrites its key.
    pub interval: Duration,
    /// Lifetime of the key; a worker silent for longer is presumed dead.
    pub ttl: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            ttl: Duration::from_secs(30),
        }
    }
}

impl HeartbeatConfig {
    /// The TTL must leave room for a missed renewal and must outlast one
    /// cleaner period, otherwise live workers get reclaimed.
    pub fn validate(&self, cleaner: &CleanerConfig) -> Result<(), ConfigError> {
        non_zero("heartbeat interval", self.interval)?;
        non_zero("heartbeat ttl", self.ttl)?;
        non_zero("cleaner interval", cleaner.interval)?;

        if self.ttl <= self.interval {
            return Err(ConfigError::TtlTooShort {
                ttl: self.ttl,
                name: "heartbeat interval",
                interval: self.interval,
            });
        }
        if self.ttl <= cleaner.interval {
            return Err(ConfigError::TtlTooShort {
                ttl: self.ttl,
                name: "cleaner interval",
                interval: cleaner.interval,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Pause between two sweeps.
    pub interval: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between polls of the pending and deferred queues when idle.
    pub poll_interval: Duration,
    /// Upper bound on deferred tasks a single worker holds in its watched queue.
    pub max_watched: usize,
    /// Tasks refused by this many workers are discarded.
    pub max_rejections: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_watched: 100,
            max_rejections: 10,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero("worker poll interval", self.poll_interval)?;
        if self.max_watched == 0 {
            return Err(ConfigError::Zero {
                name: "max watched",
            });
        }
        Ok(())
    }
}

fn non_zero(name: &'static str, d: Duration) -> Result<(), ConfigError> {
    if d.is_zero() {
        return Err(ConfigError::Zero { name });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        HeartbeatConfig::default()
            .validate(&CleanerConfig::default())
            .unwrap();
        WorkerConfig::default().validate().unwrap();
    }

    #[test]
    fn ttl_must_exceed_renew_interval() {
        let hb = HeartbeatConfig {
            interval: Duration::from_secs(10),
            ttl: Duration::from_secs(10),
        };
        let err = hb.validate(&CleanerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TtlTooShort {
                name: "heartbeat interval",
                ..
            }
        ));
    }

    #[test]
    fn ttl_must_exceed_cleaner_interval() {
        let hb = HeartbeatConfig {
            interval: Duration::from_secs(5),
            ttl: Duration::from_secs(15),
        };
        let cleaner = CleanerConfig {
            interval: Duration::from_secs(30),
        };
        let err = hb.validate(&cleaner).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TtlTooShort {
                name: "cleaner interval",
                ..
            }
        ));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let hb = HeartbeatConfig {
            interval: Duration::ZERO,
            ttl: Duration::from_secs(15),
        };
        assert_eq!(
            hb.validate(&CleanerConfig::default()),
            Err(ConfigError::Zero {
                name: "heartbeat interval"
            })
        );

        let worker = WorkerConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(worker.validate().is_err());
    }

    #[test]
    fn worker_needs_a_watched_slot() {
        let worker = WorkerConfig {
            max_watched: 0,
            ..Default::default()
        };
        assert_eq!(
            worker.validate(),
            Err(ConfigError::Zero {
                name: "max watched"
            })
        );
    }
}
