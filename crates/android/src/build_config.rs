//! Build types and the signing identity each one carries

use crate::signing::{SigningConfig, SigningConfigs};
use droidship_core::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A Gradle build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Debuggable development build
    Debug,
    /// Optimized build for distribution
    Release,
}

impl BuildType {
    /// Every build type, in declaration order
    pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

    /// Gradle name, also the prefix of the signing property keys
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    /// Capitalized form used in task names (`assembleDebug`)
    #[must_use]
    pub fn task_suffix(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(Error::invalid_input(format!(
                "Unknown build type: {other}. Use debug or release"
            ))),
        }
    }
}

/// One build type and the signing config assigned to it, if any
#[derive(Debug, Clone)]
pub struct BuildTypeConfig {
    /// The build type
    pub build_type: BuildType,
    /// Identity from the keystore properties, `None` when unsigned
    pub signing: Option<SigningConfig>,
}

/// The app module's build types
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    build_types: Vec<BuildTypeConfig>,
}

impl BuildConfiguration {
    /// Assign each build type the signing config of the same-named variant.
    ///
    /// When the keystore properties file was absent `signing` is empty and
    /// every build type stays unsigned.
    #[must_use]
    pub fn from_signing(signing: &SigningConfigs) -> Self {
        let build_types = BuildType::ALL
            .into_iter()
            .map(|build_type| BuildTypeConfig {
                build_type,
                signing: signing.get(build_type).cloned(),
            })
            .collect();
        Self { build_types }
    }

    /// All build types, debug first
    #[must_use]
    pub fn build_types(&self) -> &[BuildTypeConfig] {
        &self.build_types
    }

    /// Signing config for a build type
    #[must_use]
    pub fn signing_for(&self, build_type: BuildType) -> Option<&SigningConfig> {
        self.build_types
            .iter()
            .find(|b| b.build_type == build_type)
            .and_then(|b| b.signing.as_ref())
    }

    /// Whether the build type has a signing identity
    #[must_use]
    pub fn is_signed(&self, build_type: BuildType) -> bool {
        self.signing_for(build_type).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_build_type_parse() {
        assert_eq!("debug".parse::<BuildType>().unwrap(), BuildType::Debug);
        assert_eq!("Release".parse::<BuildType>().unwrap(), BuildType::Release);
        assert!("profile".parse::<BuildType>().is_err());
    }

    #[test]
    fn test_build_type_names() {
        assert_eq!(BuildType::Release.to_string(), "release");
        assert_eq!(BuildType::Debug.task_suffix(), "Debug");
    }

    #[test]
    fn test_unsigned_without_properties() {
        let dir = tempfile::tempdir().unwrap();
        let signing = SigningConfigs::load(&dir.path().join("key.properties"), Path::new("app")).unwrap();
        let config = BuildConfiguration::from_signing(&signing);

        assert_eq!(config.build_types().len(), 2);
        assert!(!config.is_signed(BuildType::Debug));
        assert!(!config.is_signed(BuildType::Release));
    }

    #[test]
    fn test_each_build_type_gets_matching_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.properties");
        let mut content = String::new();
        for variant in ["debug", "release"] {
            content.push_str(&format!(
                "{variant}KeyAlias={variant}-alias\n{variant}KeyPassword=kp\n{variant}StoreFile={variant}.jks\n{variant}StorePassword=sp\n"
            ));
        }
        std::fs::write(&path, content).unwrap();

        let signing = SigningConfigs::load(&path, dir.path()).unwrap();
        let config = BuildConfiguration::from_signing(&signing);

        assert_eq!(config.signing_for(BuildType::Debug).unwrap().key_alias, "debug-alias");
        assert_eq!(config.signing_for(BuildType::Release).unwrap().key_alias, "release-alias");
    }
}
