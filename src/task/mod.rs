pub mod task;

pub use task::{interpolate_template, Task, TaskError, TaskOutput};
