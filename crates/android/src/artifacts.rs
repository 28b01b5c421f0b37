//! Build artifact collection
//!
//! After Gradle produces APKs or app bundles in a tool-defined output
//! directory, [`collect`] copies them into a consolidated directory for
//! downstream consumers such as CI artifact upload. A missing output
//! directory is a no-op with a warning; filesystem failures abort.

use crate::build_config::BuildType;
use droidship_core::error::{Error, ErrorCode, Result};
use droidship_core::fs::{copy_file, ensure_dir, list_files};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of distributable produced by the app module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Installable packages (`.apk`)
    Apk,
    /// Play Store bundles (`.aab`)
    Bundle,
}

impl ArtifactKind {
    /// Label used in log messages
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Apk => "APKs",
            Self::Bundle => "bundles",
        }
    }

    /// File extension without the dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Bundle => "aab",
        }
    }

    /// Where Gradle writes this kind, relative to the Android project
    #[must_use]
    pub fn output_dir(self, app_module: &str, build_type: BuildType) -> PathBuf {
        let outputs = Path::new(app_module).join("build").join("outputs");
        match self {
            Self::Apk => outputs.join("flutter-apk"),
            Self::Bundle => outputs.join("bundle").join(build_type.name()),
        }
    }

    /// Where collected copies go, under the repository-level build root
    #[must_use]
    pub fn collected_dir(self, repo_build_root: &Path, build_type: BuildType) -> PathBuf {
        let outputs = repo_build_root.join("app").join("outputs");
        match self {
            Self::Apk => outputs.join("flutter-apk"),
            Self::Bundle => outputs.join("bundle").join(build_type.name()),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apk => "apk",
            Self::Bundle => "bundle",
        })
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "apk" => Ok(Self::Apk),
            "bundle" | "aab" => Ok(Self::Bundle),
            other => Err(Error::invalid_input(format!(
                "Unknown artifact kind: {other}. Use apk or bundle"
            ))),
        }
    }
}

/// Outcome of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CollectionResult {
    /// Files were copied; paths are relative to `source`
    Copied {
        /// Name of the artifacts
        label: String,
        /// Directory or file copied from
        source: PathBuf,
        /// Directory copied into
        dest: PathBuf,
        /// Copied files
        files: Vec<PathBuf>,
        /// Total bytes written
        bytes: u64,
    },
    /// The source did not exist
    Skipped {
        /// Name of the artifacts
        label: String,
        /// Path that was missing
        source: PathBuf,
    },
}

impl CollectionResult {
    /// Whether anything was copied
    #[must_use]
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }

    /// Files copied, empty when skipped
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Copied { files, .. } => files,
            Self::Skipped { .. } => &[],
        }
    }

    /// Name of the collected artifacts
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Copied { label, .. } | Self::Skipped { label, .. } => label,
        }
    }
}

/// Copy everything under `source` into `dest`.
///
/// - `source` is a directory: every file beneath it is copied, keeping its
///   relative path. `dest` and intermediate directories are created.
/// - `source` is a file: that file is copied into `dest`.
/// - `source` is missing: nothing happens and `dest` is not created.
/// - `dest` would alias `source` (the same path, a file source's own
///   directory, or a directory inside the source): `InvalidPath`.
///
/// Files already in `dest` with the same name are overwritten; others are
/// left alone.
pub fn collect(source: &Path, dest: &Path, label: &str) -> Result<CollectionResult> {
    let _span = tracing::info_span!("collect", label).entered();

    if !source.exists() {
        tracing::warn!(
            source = %source.display(),
            "No {label} directory found at {}; nothing to copy.",
            source.display()
        );
        return Ok(CollectionResult::Skipped {
            label: label.to_string(),
            source: source.to_path_buf(),
        });
    }

    check_locations(source, dest)?;

    let planned: Vec<(PathBuf, PathBuf)> = if source.is_file() {
        let name = source.file_name().ok_or_else(|| {
            Error::new(
                ErrorCode::InvalidPath,
                format!("Cannot determine file name of {}", source.display()),
            )
        })?;
        vec![(source.to_path_buf(), PathBuf::from(name))]
    } else {
        list_files(source)?
            .into_iter()
            .map(|rel| (source.join(&rel), rel))
            .collect()
    };

    ensure_dir(dest)?;

    let mut files = Vec::with_capacity(planned.len());
    let mut bytes = 0;
    for (from, rel) in planned {
        bytes += copy_file(&from, &dest.join(&rel))?;
        tracing::debug!(file = %rel.display(), "Copied");
        files.push(rel);
    }

    tracing::info!(
        files = files.len(),
        bytes,
        "Copied {label} from {} to {}",
        source.display(),
        dest.display()
    );

    Ok(CollectionResult::Copied {
        label: label.to_string(),
        source: source.to_path_buf(),
        dest: dest.to_path_buf(),
        files,
        bytes,
    })
}

/// Reject destinations that would overwrite the source or sit inside it.
///
/// A file source copied into its own directory would be truncated, and a
/// destination under a source directory would be walked again on the next run.
fn check_locations(source: &Path, dest: &Path) -> Result<()> {
    let source_real = resolve(source);
    let dest_real = resolve(dest);

    let problem = if source_real == dest_real {
        Some(format!("Source and destination are the same: {}", source.display()))
    } else if source.is_file() && source_real.parent() == Some(dest_real.as_path()) {
        Some(format!(
            "Destination {} already holds the source file {}",
            dest.display(),
            source.display()
        ))
    } else if source.is_dir() && dest_real.starts_with(&source_real) {
        Some(format!(
            "Destination {} is inside the source directory {}",
            dest.display(),
            source.display()
        ))
    } else {
        None
    };

    match problem {
        Some(message) => Err(Error::new(ErrorCode::InvalidPath, message)
            .with_suggestion("Choose a destination outside the build output directory")),
        None => Ok(()),
    }
}

/// Canonicalize the longest existing prefix of `path` and append the rest,
/// so destinations that do not exist yet still compare against real paths.
fn resolve(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return missing.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Resolves conventional Flutter/Gradle output locations for an Android
/// project and collects from them.
#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    android_dir: PathBuf,
    app_module: String,
    repo_build_root: PathBuf,
}

impl ArtifactCollector {
    /// `repo_build_root` is relative to `android_dir` unless absolute
    pub fn new(
        android_dir: impl Into<PathBuf>,
        app_module: impl Into<String>,
        repo_build_root: impl AsRef<Path>,
    ) -> Self {
        let android_dir = android_dir.into();
        let repo_build_root = android_dir.join(repo_build_root);
        Self {
            android_dir,
            app_module: app_module.into(),
            repo_build_root,
        }
    }

    /// Android project directory
    #[must_use]
    pub fn android_dir(&self) -> &Path {
        &self.android_dir
    }

    /// Source and destination for an artifact kind
    #[must_use]
    pub fn paths_for(&self, kind: ArtifactKind, build_type: BuildType) -> (PathBuf, PathBuf) {
        (
            self.android_dir
                .join(kind.output_dir(&self.app_module, build_type)),
            kind.collected_dir(&self.repo_build_root, build_type),
        )
    }

    /// Collect one artifact kind from its conventional location
    pub fn collect_kind(&self, kind: ArtifactKind, build_type: BuildType) -> Result<CollectionResult> {
        let (source, dest) = self.paths_for(kind, build_type);
        collect(&source, &dest, kind.label())
    }

    /// Location of the single APK Gradle produces for a variant
    #[must_use]
    pub fn variant_apk(&self, flavor: Option<&str>, build_type: BuildType) -> PathBuf {
        let apk_dir = self.repo_build_root.join("app").join("outputs").join("apk");
        match flavor {
            Some(flavor) => apk_dir
                .join(flavor)
                .join(build_type.name())
                .join(format!("app-{flavor}-{}.apk", build_type.name())),
            None => apk_dir
                .join(build_type.name())
                .join(format!("app-{}.apk", build_type.name())),
        }
    }

    /// Copy a variant's APK into `dest`, defaulting to the collected APK
    /// directory
    pub fn collect_variant_apk(
        &self,
        flavor: Option<&str>,
        build_type: BuildType,
        dest: Option<&Path>,
    ) -> Result<CollectionResult> {
        let source = self.variant_apk(flavor, build_type);
        let dest = dest.map_or_else(
            || ArtifactKind::Apk.collected_dir(&self.repo_build_root, build_type),
            Path::to_path_buf,
        );
        let label = match flavor {
            Some(flavor) => format!("{flavor}-{build_type} APK"),
            None => format!("{build_type} APK"),
        };
        collect(&source, &dest, &label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidship_core::error::ErrorCode;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_copies_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("flutter-apk");
        let dest = dir.path().join("out");
        write(&source.join("app-debug.apk"), "debug apk");
        write(&source.join("app-debug.apk.sha1"), "abc123");
        write(&source.join("app-release.apk"), "release apk");

        let result = collect(&source, &dest, "APKs").unwrap();

        assert!(result.is_copied());
        assert_eq!(result.files().len(), 3);
        assert_eq!(list_files(&dest).unwrap(), list_files(&source).unwrap());
        for name in ["app-debug.apk", "app-debug.apk.sha1", "app-release.apk"] {
            assert_eq!(
                std::fs::read(dest.join(name)).unwrap(),
                std::fs::read(source.join(name)).unwrap()
            );
        }
    }

    #[test]
    fn test_collect_missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing");
        let dest = dir.path().join("out");

        let result = collect(&source, &dest, "APKs").unwrap();

        assert_eq!(
            result,
            CollectionResult::Skipped {
                label: "APKs".to_string(),
                source: source.clone(),
            }
        );
        assert!(!dest.exists());
    }

    #[test]
    fn test_collect_missing_source_leaves_dest_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        write(&dest.join("keep.apk"), "keep");

        collect(&dir.path().join("missing"), &dest, "APKs").unwrap();

        assert_eq!(list_files(&dest).unwrap(), vec![PathBuf::from("keep.apk")]);
        assert_eq!(std::fs::read_to_string(dest.join("keep.apk")).unwrap(), "keep");
    }

    #[test]
    fn test_collect_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("dest");
        write(&source.join("app-release.apk"), "fresh build");
        write(&dest.join("app-release.apk"), "stale build from yesterday");
        write(&dest.join("other.apk"), "untouched");

        collect(&source, &dest, "APKs").unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("app-release.apk")).unwrap(),
            "fresh build"
        );
        assert_eq!(std::fs::read_to_string(dest.join("other.apk")).unwrap(), "untouched");
    }

    #[test]
    fn test_collect_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("dest");
        write(&source.join("app.aab"), "bundle");

        let first = collect(&source, &dest, "bundles").unwrap();
        let second = collect(&source, &dest, "bundles").unwrap();

        assert_eq!(first, second);
        assert_eq!(list_files(&dest).unwrap(), vec![PathBuf::from("app.aab")]);
    }

    #[test]
    fn test_collect_empty_source_creates_dest() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir(&source).unwrap();
        let dest = dir.path().join("a/b/dest");

        let result = collect(&source, &dest, "APKs").unwrap();

        assert!(result.is_copied());
        assert!(result.files().is_empty());
        assert!(dest.is_dir());
    }

    #[test]
    fn test_collect_preserves_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("dest");
        write(&source.join("arm64-v8a/app.apk"), "arm");

        collect(&source, &dest, "APKs").unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("arm64-v8a/app.apk")).unwrap(),
            "arm"
        );
    }

    #[test]
    fn test_collect_single_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app-release.aab");
        write(&source, "bundle");
        let dest = dir.path().join("dest");

        let result = collect(&source, &dest, "bundle").unwrap();

        assert_eq!(result.files(), &[PathBuf::from("app-release.aab")]);
        assert!(dest.join("app-release.aab").is_file());
    }

    #[test]
    fn test_collect_into_itself_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write(&source.join("app.apk"), "apk");

        let err = collect(&source, &source, "APKs").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(std::fs::read_to_string(source.join("app.apk")).unwrap(), "apk");
    }

    #[test]
    fn test_collect_file_into_its_own_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("app-release.apk");
        write(&apk, "real apk bytes");

        let err = collect(&apk, dir.path(), "APK").unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(std::fs::read_to_string(&apk).unwrap(), "real apk bytes");
    }

    #[test]
    fn test_collect_file_into_same_directory_via_dot_segment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("apk/app-debug.apk");
        write(&apk, "debug");

        let dest = dir.path().join("apk/../apk");
        let err = collect(&apk, &dest, "APK").unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(std::fs::read_to_string(&apk).unwrap(), "debug");
    }

    #[test]
    fn test_collect_into_subdirectory_of_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write(&source.join("a.apk"), "a");
        let dest = source.join("out");

        let err = collect(&source, &dest, "APKs").unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert!(!dest.exists());
        assert_eq!(list_files(&source).unwrap(), vec![PathBuf::from("a.apk")]);
    }

    #[test]
    fn test_collect_into_missing_nested_dir_of_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write(&source.join("a.apk"), "a");

        let err = collect(&source, &source.join("x/y"), "APKs").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert!(!source.join("x").exists());
    }

    #[test]
    fn test_collect_sibling_with_shared_prefix_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("out");
        write(&source.join("a.apk"), "a");
        let dest = dir.path().join("out-collected");

        let result = collect(&source, &dest, "APKs").unwrap();
        assert_eq!(result.files(), &[PathBuf::from("a.apk")]);
    }

    #[test]
    fn test_collect_dest_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write(&source.join("app.apk"), "apk");
        let dest = dir.path().join("dest");
        write(&dest, "not a directory");

        assert!(collect(&source, &dest, "APKs").is_err());
    }

    #[test]
    fn test_collection_result_serializes_status() {
        let skipped = CollectionResult::Skipped {
            label: "APKs".to_string(),
            source: PathBuf::from("app/build/outputs/flutter-apk"),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
    }

    #[test]
    fn test_artifact_kind_dirs() {
        assert_eq!(
            ArtifactKind::Apk.output_dir("app", BuildType::Debug),
            PathBuf::from("app/build/outputs/flutter-apk")
        );
        assert_eq!(
            ArtifactKind::Bundle.output_dir("app", BuildType::Release),
            PathBuf::from("app/build/outputs/bundle/release")
        );
        assert_eq!(
            ArtifactKind::Bundle.collected_dir(Path::new("../build"), BuildType::Release),
            PathBuf::from("../build/app/outputs/bundle/release")
        );
        assert_eq!("aab".parse::<ArtifactKind>().unwrap(), ArtifactKind::Bundle);
        assert!("ipa".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_collector_collect_kind() {
        let dir = tempfile::tempdir().unwrap();
        let android = dir.path().join("android");
        write(
            &android.join("app/build/outputs/bundle/release/app-release.aab"),
            "aab",
        );

        let collector = ArtifactCollector::new(&android, "app", "../build");
        let result = collector
            .collect_kind(ArtifactKind::Bundle, BuildType::Release)
            .unwrap();

        assert!(result.is_copied());
        assert!(android
            .join("../build/app/outputs/bundle/release/app-release.aab")
            .is_file());
    }

    #[test]
    fn test_variant_apk_paths() {
        let collector = ArtifactCollector::new("android", "app", "../build");
        assert_eq!(
            collector.variant_apk(Some("prod"), BuildType::Release),
            PathBuf::from("android/../build/app/outputs/apk/prod/release/app-prod-release.apk")
        );
        assert_eq!(
            collector.variant_apk(None, BuildType::Debug),
            PathBuf::from("android/../build/app/outputs/apk/debug/app-debug.apk")
        );
    }

    #[test]
    fn test_collect_variant_apk() {
        let dir = tempfile::tempdir().unwrap();
        let android = dir.path().join("android");
        std::fs::create_dir_all(&android).unwrap();
        let collector = ArtifactCollector::new(&android, "app", "../build");

        let skipped = collector
            .collect_variant_apk(Some("dev"), BuildType::Debug, None)
            .unwrap();
        assert!(!skipped.is_copied());

        write(&collector.variant_apk(Some("dev"), BuildType::Debug), "apk");
        let copied = collector
            .collect_variant_apk(Some("dev"), BuildType::Debug, None)
            .unwrap();
        assert_eq!(copied.files(), &[PathBuf::from("app-dev-debug.apk")]);
        assert!(android
            .join("../build/app/outputs/flutter-apk/app-dev-debug.apk")
            .is_file());
    }

    #[test]
    fn test_collect_variant_apk_into_its_own_dir_keeps_apk() {
        let dir = tempfile::tempdir().unwrap();
        let android = dir.path().join("android");
        std::fs::create_dir_all(&android).unwrap();
        let collector = ArtifactCollector::new(&android, "app", "../build");
        let apk = collector.variant_apk(None, BuildType::Release);
        write(&apk, "signed release");

        let err = collector
            .collect_variant_apk(None, BuildType::Release, apk.parent())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(std::fs::read_to_string(&apk).unwrap(), "signed release");
    }
}
