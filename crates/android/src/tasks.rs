//! Named post-build collection tasks
//!
//! Each task declares the Gradle task it depends on. Running it runs that
//! dependency first and only collects when the dependency succeeds.

use crate::artifacts::{collect, CollectionResult};
use crate::gradle;
use droidship_cli::progress;
use droidship_core::config::{CollectTaskConfig, ConfigSchema};
use droidship_core::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Number of trailing stderr lines kept when a captured Gradle run fails
const FAILURE_TAIL_LINES: usize = 20;

/// Executes upstream Gradle tasks
pub trait TaskRunner {
    /// Run `task` in `project_dir`, failing if it does not succeed
    fn run_gradle_task(&self, project_dir: &Path, task: &str) -> Result<()>;
}

/// Runs tasks through the project's Gradle wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct GradleRunner {
    /// Pass Gradle output through instead of showing a spinner
    pub stream: bool,
}

impl TaskRunner for GradleRunner {
    fn run_gradle_task(&self, project_dir: &Path, task: &str) -> Result<()> {
        if self.stream {
            let code = gradle::run_task_streaming(project_dir, task)?;
            if code != 0 {
                return Err(Error::gradle(format!(
                    "Gradle task {task} failed with exit code {code}"
                )));
            }
            return Ok(());
        }

        let pb = progress::spinner(&format!("Running {task}"));
        let result = match gradle::run_task(project_dir, task) {
            Ok(result) => result,
            Err(e) => {
                progress::finish_error(&pb, &format!("{task} could not start"));
                return Err(e);
            }
        };

        if result.success {
            progress::finish_success(&pb, task);
            Ok(())
        } else {
            progress::finish_error(&pb, &format!("{task} failed"));
            let output = result.combined_output();
            let lines: Vec<&str> = output.lines().collect();
            let tail = lines[lines.len().saturating_sub(FAILURE_TAIL_LINES)..].join("\n");
            Err(Error::gradle(format!(
                "Gradle task {task} failed with exit code {}",
                result.exit_code
            ))
            .with_context(tail))
        }
    }
}

/// A registered collection task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectTask {
    /// Unique task name, e.g. `assembleDebugAndCopy`
    pub name: String,
    /// Group the task is listed under
    pub group: String,
    /// One-line description for `tasks`
    pub description: Option<String>,
    /// Gradle task run first, e.g. `:app:assembleDebug`
    pub depends_on: String,
    /// Output directory, relative to the Android project
    pub source: PathBuf,
    /// Collection directory, relative to the Android project
    pub dest: PathBuf,
    /// Name of the artifacts in log messages
    pub label: String,
}

impl From<CollectTaskConfig> for CollectTask {
    fn from(config: CollectTaskConfig) -> Self {
        Self {
            name: config.name,
            group: config.group,
            description: config.description,
            depends_on: config.depends_on,
            source: config.source,
            dest: config.dest,
            label: config.label,
        }
    }
}

/// Tasks available for an Android project
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    android_dir: PathBuf,
    tasks: Vec<CollectTask>,
}

impl TaskRegistry {
    /// An empty registry for a project
    pub fn new(android_dir: impl Into<PathBuf>) -> Self {
        Self {
            android_dir: android_dir.into(),
            tasks: Vec::new(),
        }
    }

    /// Register every task in the configuration
    pub fn from_config(schema: &ConfigSchema, android_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = Self::new(android_dir);
        for task in &schema.tasks {
            registry.register(task.clone().into())?;
        }
        Ok(registry)
    }

    /// Add a task; names must be unique
    pub fn register(&mut self, task: CollectTask) -> Result<()> {
        if self.get(&task.name).is_some() {
            return Err(Error::config_validation(format!(
                "Task '{}' is already registered",
                task.name
            )));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Tasks in registration order
    #[must_use]
    pub fn list(&self) -> &[CollectTask] {
        &self.tasks
    }

    /// Find a task by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Run a task: its Gradle dependency first (unless `skip_deps`), then
    /// the collection.
    pub fn run(
        &self,
        name: &str,
        runner: &impl TaskRunner,
        skip_deps: bool,
    ) -> Result<CollectionResult> {
        let task = self.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.tasks.iter().map(|t| t.name.as_str()).collect();
            Error::invalid_input(format!("Unknown task: {name}"))
                .with_suggestion(format!("Available tasks: {}", known.join(", ")))
        })?;

        if skip_deps {
            tracing::debug!(task = name, dependency = %task.depends_on, "Skipping dependency");
        } else {
            runner
                .run_gradle_task(&self.android_dir, &task.depends_on)
                .map_err(|e| e.with_context(format!("Dependency of task {name}")))?;
        }

        collect(
            &self.android_dir.join(&task.source),
            &self.android_dir.join(&task.dest),
            &task.label,
        )
    }
}
