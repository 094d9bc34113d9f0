pub mod analysis;
pub mod dependency;
pub mod freshness;

pub use analysis::report_unknown_dependencies;
pub use dependency::{Dependencies, all_dependencies, stub_dependency_pairs};
pub use freshness::{Staleness, Watermark};

use std::{future::Future, path::PathBuf};

use crate::error::Result;

/// One incremental build step. The action is handed to [`TaskRunner::run`] separately.
#[derive(Debug, Clone)]
pub struct Task {
    pub run_message: String,
    pub skip_message: String,
    pub targets: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
}

impl Task {
    pub fn new(run_message: impl Into<String>, skip_message: impl Into<String>) -> Self {
        Self {
            run_message: run_message.into(),
            skip_message: skip_message.into(),
            targets: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn targets<I, P>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    pub fn sources<I, P>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    fn joined_targets(&self) -> String {
        self.targets
            .iter()
            .map(|t| t.to_string_lossy())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Ran,
    Skipped,
    /// The task was stale but `--dry-run` kept the action from running.
    WouldRun,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRunner {
    verbose: bool,
    dry_run: bool,
}

impl TaskRunner {
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        Self { verbose, dry_run }
    }

    /// Runs `action` unless every target is up to date with every source.
    ///
    /// Nothing is recorded besides what the action writes to disk, so a failed action
    /// leaves its targets stale and the next invocation tries again.
    pub async fn run<F, Fut>(&self, task: &Task, action: F) -> Result<TaskOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let staleness = freshness::check(&task.targets, &task.sources)?;

        if !staleness.must_run() {
            println!(
                "{} is up to date, skipping {}",
                task.joined_targets(),
                task.skip_message
            );
            return Ok(TaskOutcome::Skipped);
        }

        if self.verbose {
            println!("Info: {}: {}", task.skip_message, staleness.describe());
        }

        if self.dry_run {
            println!("Would run: {}", task.run_message);
            return Ok(TaskOutcome::WouldRun);
        }

        println!("{}", task.run_message);
        action().await?;

        Ok(TaskOutcome::Ran)
    }
}
