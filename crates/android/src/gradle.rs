//! Gradle wrapper integration
//!
//! Runs tasks through the project's `gradlew` so the pinned Gradle version
//! is used.

use crate::artifacts::ArtifactKind;
use crate::build_config::BuildType;
use droidship_core::error::{Error, Result};
use droidship_core::process::{run_command_in_dir, run_command_streaming_in_dir, CommandResult};
use std::path::{Path, PathBuf};

/// File name of the wrapper script on this platform
#[must_use]
pub fn wrapper_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

/// Path of the wrapper script in a project
#[must_use]
pub fn wrapper_path(project_dir: &Path) -> PathBuf {
    project_dir.join(wrapper_name())
}

/// Whether the project has a Gradle wrapper
#[must_use]
pub fn has_wrapper(project_dir: &Path) -> bool {
    wrapper_path(project_dir).is_file()
}

fn resolve_wrapper(project_dir: &Path) -> Result<String> {
    let wrapper = wrapper_path(project_dir);
    if !wrapper.is_file() {
        return Err(Error::command_not_found(&wrapper.display().to_string())
            .with_suggestion("Run from the Android project directory or pass --android-dir"));
    }
    let absolute = wrapper.canonicalize()?;
    Ok(absolute.to_string_lossy().into_owned())
}

/// Run a Gradle task, capturing output
pub fn run_task(project_dir: &Path, task: &str) -> Result<CommandResult> {
    let wrapper = resolve_wrapper(project_dir)?;
    tracing::info!(task, "Running Gradle task");
    run_command_in_dir(&wrapper, &[task], project_dir)
}

/// Run a Gradle task with output passed through to the terminal
pub fn run_task_streaming(project_dir: &Path, task: &str) -> Result<i32> {
    let wrapper = resolve_wrapper(project_dir)?;
    tracing::info!(task, "Running Gradle task");
    run_command_streaming_in_dir(&wrapper, &[task], project_dir)
}

/// Task path producing an artifact kind for a build type, e.g.
/// `:app:assembleRelease` or `:app:bundleDebug`
#[must_use]
pub fn task_for(app_module: &str, kind: ArtifactKind, build_type: BuildType) -> String {
    let verb = match kind {
        ArtifactKind::Apk => "assemble",
        ArtifactKind::Bundle => "bundle",
    };
    format!(":{app_module}:{verb}{}", build_type.task_suffix())
}

/// Clean build artifacts
pub fn clean(project_dir: &Path) -> Result<CommandResult> {
    run_task(project_dir, "clean")
}
