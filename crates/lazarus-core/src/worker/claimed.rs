use lazarus_model::Task;

/// A task taken into one of the worker's own queues.
///
/// `raw` is the exact payload as stored. Every later transition of the task
/// (complete, fire, release, reject) addresses the element by this string, so
/// it is kept alongside the decoded form rather than re-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedTask {
    pub raw: String,
    pub task: Task,
}

impl ClaimedTask {
    #[inline]
    pub fn new(raw: String, task: Task) -> Self {
        Self { raw, task }
    }
}
