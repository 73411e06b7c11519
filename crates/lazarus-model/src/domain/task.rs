use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{TaskId, UnixMs};

/// Job arguments.
///
/// Ordered so that encoding the same task twice yields identical bytes.
pub type Args = BTreeMap<String, String>;

/// A unit of work travelling through the queues.
///
/// The store only ever sees the JSON encoding of this struct; queue moves
/// operate on the encoded string, never on a re-encoded copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Name used to route the task to a registered job.
    pub job_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: Args,
    /// Earliest time the task may run. Only meaningful for deferred tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_time: Option<UnixMs>,
    /// How many workers refused the task because they had no matching job.
    #[serde(default)]
    pub worker_rejection_count: u32,
}

#[derive(Debug, Error)]
#[error("task payload codec: {0}")]
pub struct TaskCodecError(#[from] serde_json::Error);

impl Task {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            id: TaskId::generate(),
            job_name: job_name.into(),
            args: Args::new(),
            execute_time: None,
            worker_rejection_count: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_execute_time(mut self, at: UnixMs) -> Self {
        self.execute_time = Some(at);
        self
    }

    /// Returns `true` once the task may run at `now`.
    ///
    /// Tasks without an execute time are always due.
    pub fn is_due(&self, now: UnixMs) -> bool {
        self.execute_time.is_none_or(|at| at <= now)
    }

    pub fn encode(&self) -> Result<String, TaskCodecError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, TaskCodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_stable_for_equal_tasks() {
        let a = Task::new("provision")
            .with_id("t-1")
            .with_arg("b", "2")
            .with_arg("a", "1");
        let b = Task::new("provision")
            .with_id("t-1")
            .with_arg("a", "1")
            .with_arg("b", "2");
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn decode_accepts_minimal_payload() {
        let task = Task::decode(r#"{"id":"t-9","jobName":"noop"}"#).unwrap();
        assert_eq!(task.id, TaskId::from("t-9"));
        assert_eq!(task.job_name, "noop");
        assert!(task.args.is_empty());
        assert_eq!(task.execute_time, None);
        assert_eq!(task.worker_rejection_count, 0);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Task::decode("not json").is_err());
    }

    #[test]
    fn due_check_respects_execute_time() {
        let immediate = Task::new("x");
        assert!(immediate.is_due(0));

        let later = Task::new("x").with_execute_time(1_000);
        assert!(!later.is_due(999));
        assert!(later.is_due(1_000));
        assert!(later.is_due(5_000));
    }
}
