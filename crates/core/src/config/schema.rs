//! Configuration schema definitions
//!
//! Defaults mirror the layout of a Flutter-generated Android project, where
//! the Gradle root lives in `android/` and the repository-level build output
//! root is one directory above it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub signing: SigningSettings,

    #[serde(default)]
    pub log: LogConfig,

    /// Post-build collection tasks, in registration order
    #[serde(default = "default_tasks")]
    pub tasks: Vec<CollectTaskConfig>,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            signing: SigningSettings::default(),
            log: LogConfig::default(),
            tasks: default_tasks(),
        }
    }
}

/// Android project layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Gradle root project directory (contains `gradlew` and `app/`)
    #[serde(default = "default_android_dir")]
    pub android_dir: PathBuf,

    /// Application module directory, relative to `android_dir`
    #[serde(default = "default_app_module")]
    pub app_module: String,

    /// Repository-level build output root, relative to `android_dir`
    #[serde(default = "default_repo_build_root")]
    pub repo_build_root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            android_dir: default_android_dir(),
            app_module: default_app_module(),
            repo_build_root: default_repo_build_root(),
        }
    }
}

fn default_android_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_app_module() -> String {
    "app".to_string()
}

fn default_repo_build_root() -> PathBuf {
    PathBuf::from("../build")
}

/// Keystore properties location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningSettings {
    /// Properties file holding signing credentials, relative to `android_dir`
    #[serde(default = "default_properties_file")]
    pub properties_file: PathBuf,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            properties_file: default_properties_file(),
        }
    }
}

fn default_properties_file() -> PathBuf {
    PathBuf::from("key.properties")
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A named post-build task copying one output directory into another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectTaskConfig {
    pub name: String,

    #[serde(default = "default_group")]
    pub group: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Upstream Gradle task path, e.g. `:app:assembleDebug`
    pub depends_on: String,

    /// Source directory, relative to `android_dir`
    pub source: PathBuf,

    /// Destination directory, relative to `android_dir`
    pub dest: PathBuf,

    /// Human-readable artifact label used in log messages
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_group() -> String {
    "build".to_string()
}

fn default_label() -> String {
    "artifacts".to_string()
}

fn default_tasks() -> Vec<CollectTaskConfig> {
    vec![
        CollectTaskConfig {
            name: "assembleDebugAndCopy".to_string(),
            group: default_group(),
            description: Some(
                "Run :app:assembleDebug and copy generated flutter-apk to ../build/app/outputs/flutter-apk"
                    .to_string(),
            ),
            depends_on: ":app:assembleDebug".to_string(),
            source: PathBuf::from("app/build/outputs/flutter-apk"),
            dest: PathBuf::from("../build/app/outputs/flutter-apk"),
            label: "APKs".to_string(),
        },
        CollectTaskConfig {
            name: "bundleReleaseAndCopy".to_string(),
            group: default_group(),
            description: Some(
                "Run :app:bundleRelease and copy generated bundles to ../build/app/outputs/bundle/release"
                    .to_string(),
            ),
            depends_on: ":app:bundleRelease".to_string(),
            source: PathBuf::from("app/build/outputs/bundle/release"),
            dest: PathBuf::from("../build/app/outputs/bundle/release"),
            label: "bundles".to_string(),
        },
    ]
}
