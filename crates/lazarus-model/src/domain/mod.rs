mod task_id;
pub use task_id::TaskId;

mod worker_id;
pub use worker_id::WorkerId;

mod task;
pub use task::{Args, Task, TaskCodecError};

mod clock;
pub use clock::{UnixMs, unix_ms};
