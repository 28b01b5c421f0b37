//! Environment health checks
//!
//! Used by `droidship doctor` to report on tools, environment variables and
//! project paths before a build is attempted.

use crate::process::{command_exists, run_command};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All checks passed
    Healthy,
    /// Some optional checks failed
    Degraded,
    /// Required checks failed
    Unhealthy,
}

impl HealthStatus {
    /// Returns true if status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns true if status is healthy or degraded (still operational)
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: HealthStatus,
    /// Optional message with details
    pub message: Option<String>,
    /// Duration of the check in milliseconds
    pub duration_ms: u64,
    /// Additional details as key-value pairs
    pub details: BTreeMap<String, String>,
}

impl CheckResult {
    /// Create a healthy check result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create an unhealthy check result with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create a degraded check result with a message
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Add a detail key-value pair
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Overall health report containing all check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status based on all checks
    pub status: HealthStatus,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Total duration of all checks in milliseconds
    pub total_duration_ms: u64,
    /// Timestamp when the report was generated
    pub timestamp: String,
    /// Version of the tool
    pub version: String,
}

impl HealthReport {
    /// Create a new health report from check results
    #[must_use]
    pub fn new(checks: Vec<CheckResult>, duration: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            checks,
            total_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns true if overall status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Get all checks that failed (not healthy)
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.status.is_healthy()).collect()
    }
}

/// Health checker with configurable checks
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthCheck>>,
}

impl HealthChecker {
    /// Create a new health checker with no checks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a health check
    #[must_use]
    pub fn add_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Add optional checks for the JVM and Flutter toolchains
    #[must_use]
    pub fn with_toolchain_checks(self) -> Self {
        self.add_check(EnvVarCheck::optional("ANDROID_HOME"))
            .add_check(EnvVarCheck::optional("JAVA_HOME"))
            .add_check(CommandCheck::optional("java", Some("-version")))
            .add_check(CommandCheck::optional("flutter", Some("--version")))
    }

    /// Run all health checks
    #[must_use]
    pub fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            let mut result = check.check();
            result.duration_ms =
                u64::try_from(check_start.elapsed().as_millis()).unwrap_or(u64::MAX);
            results.push(result);
        }

        HealthReport::new(results, start.elapsed())
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    /// Perform the health check and return a result
    fn check(&self) -> CheckResult;
}

/// Check if a command is available
pub struct CommandCheck {
    command: String,
    version_arg: Option<String>,
    required: bool,
}

impl CommandCheck {
    /// Create a required command check
    pub fn new(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            command: command.into(),
            version_arg: version_arg.map(String::from),
            required: true,
        }
    }

    /// Create an optional command check (degraded if missing, not unhealthy)
    pub fn optional(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            required: false,
            ..Self::new(command, version_arg)
        }
    }
}

impl HealthCheck for CommandCheck {
    fn check(&self) -> CheckResult {
        if !command_exists(&self.command) {
            return if self.required {
                CheckResult::unhealthy(&self.command, format!("{} is not installed", self.command))
            } else {
                CheckResult::degraded(
                    &self.command,
                    format!("{} is not installed (optional)", self.command),
                )
            };
        }

        let Some(ref arg) = self.version_arg else {
            return CheckResult::healthy(&self.command);
        };

        match run_command(&self.command, &[arg]) {
            // `java -version` reports on stderr
            Ok(output) if output.success => {
                let combined = output.combined_output();
                let version = combined.lines().next().unwrap_or("").trim().to_string();
                CheckResult::healthy(&self.command).with_detail("version", version)
            }
            _ => CheckResult::healthy(&self.command),
        }
    }
}

/// Check if an environment variable is set
pub struct EnvVarCheck {
    var_name: String,
    required: bool,
}

impl EnvVarCheck {
    /// Create a required environment variable check
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: true,
        }
    }

    /// Create an optional environment variable check
    pub fn optional(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: false,
        }
    }
}

impl HealthCheck for EnvVarCheck {
    fn check(&self) -> CheckResult {
        match std::env::var(&self.var_name) {
            Ok(value) => CheckResult::healthy(&self.var_name).with_detail("value", value),
            Err(_) if self.required => {
                CheckResult::unhealthy(&self.var_name, format!("{} is not set", self.var_name))
            }
            Err(_) => CheckResult::degraded(
                &self.var_name,
                format!("{} is not set (optional)", self.var_name),
            ),
        }
    }
}

/// Check that a path exists
pub struct PathCheck {
    name: String,
    path: PathBuf,
    required: bool,
}

impl PathCheck {
    /// A path that must exist
    pub fn required(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            required: true,
        }
    }

    /// A path whose absence only degrades the report
    pub fn optional(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            required: false,
            ..Self::required(name, path)
        }
    }
}

impl HealthCheck for PathCheck {
    fn check(&self) -> CheckResult {
        let shown = self.path.display().to_string();
        if self.path.exists() {
            return CheckResult::healthy(&self.name).with_detail("path", shown);
        }

        let message = format!("{shown} does not exist");
        if self.required {
            CheckResult::unhealthy(&self.name, message)
        } else {
            CheckResult::degraded(&self.name, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_check_optional() {
        let check = CommandCheck::optional("nonexistent_command_12345", None);
        let result = check.check();
        // Should be degraded, not unhealthy
        assert_eq!(result.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_command_check_required() {
        let result = CommandCheck::new("nonexistent_command_12345", None).check();
        assert_eq!(result.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_path_check() {
        let dir = tempfile::tempdir().unwrap();
        let present = PathCheck::required("dir", dir.path()).check();
        assert!(present.status.is_healthy());

        let missing = PathCheck::optional("keystore", dir.path().join("key.properties")).check();
        assert_eq!(missing.status, HealthStatus::Degraded);

        let missing = PathCheck::required("gradlew", dir.path().join("gradlew")).check();
        assert_eq!(missing.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_health_report() {
        let checks = vec![CheckResult::healthy("check1"), CheckResult::healthy("check2")];
        let report = HealthReport::new(checks, Duration::from_millis(100));
        assert!(report.is_healthy());
    }

    #[test]
    fn test_health_report_degraded() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::degraded("check2", "optional"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(1));
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(report.status.is_operational());
        assert_eq!(report.failed_checks().len(), 1);
    }

    #[test]
    fn test_health_report_with_failure() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::unhealthy("check2", "Failed"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(100));
        assert!(!report.is_healthy());
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }
}
