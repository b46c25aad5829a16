pub mod status;
pub mod task;

pub use status::{TaskStatus, TaskType};
pub use task::{NewTask, Task, TaskListQuery, TaskOutcome};
