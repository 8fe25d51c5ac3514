pub mod task;

pub use crate::domain::task::TaskConfig;
pub use task::{apply_env_overrides, load_task_config};
