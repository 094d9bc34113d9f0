pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod task;
pub mod template;
pub mod util;

pub use config::{Project, load_project};
pub use error::{BuildError, Result};
pub use pipeline::Pipeline;
pub use task::{Task, TaskOutcome, TaskRunner};
