//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File names searched, in order, when no `--config` is given
pub const CONFIG_CANDIDATES: [&str; 3] =
    [".droidship.toml", "droidship.toml", ".config/droidship.toml"];

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path that does not exist is an error; when searching the
    /// standard locations a missing file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(Path::new(".")),
        };

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        validate(&schema)?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Resolve the Android project directory, preferring an explicit override
    #[must_use]
    pub fn android_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir.map_or_else(|| self.schema.project.android_dir.clone(), Path::to_path_buf)
    }
}

/// Find configuration file in standard locations under `root`
fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read config file {}", path.display()))?;

    toml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))
}

fn validate(schema: &ConfigSchema) -> Result<()> {
    let mut seen = HashSet::new();
    for task in &schema.tasks {
        if task.name.trim().is_empty() {
            return Err(Error::config_validation("Task name must not be empty"));
        }
        if task.depends_on.trim().is_empty() {
            return Err(Error::config_validation(format!(
                "Task '{}' must declare the Gradle task it depends on",
                task.name
            )));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(Error::config_validation(format!(
                "Task '{}' is registered more than once",
                task.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.tasks.len(), 2);
        assert_eq!(config.schema.tasks[0].name, "assembleDebugAndCopy");
        assert_eq!(
            config.schema.signing.properties_file,
            PathBuf::from("key.properties")
        );
    }

    #[test]
    fn test_config_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/droidship.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droidship.toml");
        std::fs::write(
            &path,
            r#"
[project]
android_dir = "android"

[log]
level = "debug"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema.project.android_dir, PathBuf::from("android"));
        assert_eq!(config.schema.project.app_module, "app");
        assert_eq!(config.schema.log.level, "debug");
        // Omitted tasks fall back to the built-in pair
        assert_eq!(config.schema.tasks.len(), 2);
    }

    #[test]
    fn test_config_custom_tasks_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droidship.toml");
        std::fs::write(
            &path,
            r#"
[[tasks]]
name = "assembleReleaseAndCopy"
depends_on = ":app:assembleRelease"
source = "app/build/outputs/flutter-apk"
dest = "../dist"
label = "release APKs"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema.tasks.len(), 1);
        assert_eq!(config.schema.tasks[0].group, "build");
        assert!(config.schema.tasks[0].description.is_none());
    }

    #[test]
    fn test_config_rejects_duplicate_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droidship.toml");
        let task = r#"
[[tasks]]
name = "copy"
depends_on = ":app:assembleDebug"
source = "a"
dest = "b"
"#;
        std::fs::write(&path, format!("{task}{task}")).unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
    }

    #[test]
    fn test_config_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droidship.toml");
        std::fs::write(&path, "[project\nandroid_dir = ").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_find_config_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_file(dir.path()).is_none());

        std::fs::write(dir.path().join("droidship.toml"), "").unwrap();
        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join("droidship.toml"))
        );
    }

    #[test]
    fn test_android_dir_override() {
        let config = Config::default();
        assert_eq!(config.android_dir(None), PathBuf::from("."));
        assert_eq!(
            config.android_dir(Some(Path::new("android"))),
            PathBuf::from("android")
        );
    }
}
