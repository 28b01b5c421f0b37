//! Signing configuration loaded from a keystore properties file
//!
//! The file is optional. When present it must define, for each of the
//! `debug` and `release` variants:
//!
//! | key                        | required |
//! |----------------------------|----------|
//! | `<variant>KeyAlias`        | yes      |
//! | `<variant>KeyPassword`     | yes      |
//! | `<variant>StoreFile`       | no       |
//! | `<variant>StorePassword`   | yes      |
//!
//! A relative `StoreFile` resolves against the app module directory.

use crate::build_config::BuildType;
use droidship_core::error::{Error, Result};
use droidship_core::properties::Properties;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

const KEY_ALIAS: &str = "KeyAlias";
const KEY_PASSWORD: &str = "KeyPassword";
const STORE_FILE: &str = "StoreFile";
const STORE_PASSWORD: &str = "StorePassword";

/// Credentials for one signing identity
#[derive(Clone, PartialEq, Eq)]
pub struct SigningConfig {
    /// Alias of the key inside the keystore
    pub key_alias: String,
    /// Password for the key
    pub key_password: String,
    /// Keystore path, resolved against the app module
    pub store_file: Option<PathBuf>,
    /// Password for the keystore
    pub store_password: String,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("key_alias", &self.key_alias)
            .field("key_password", &"***")
            .field("store_file", &self.store_file)
            .field("store_password", &"***")
            .finish()
    }
}

impl SigningConfig {
    fn from_properties(
        props: &Properties,
        variant: BuildType,
        module_dir: &Path,
        source: &Path,
    ) -> Result<Self> {
        let required = |suffix: &str| -> Result<String> {
            let key = format!("{}{suffix}", variant.name());
            props
                .get(&key)
                .map(str::to_string)
                .ok_or_else(|| Error::signing_incomplete(variant.name(), &key, source))
        };

        let store_file = props
            .get(&format!("{}{STORE_FILE}", variant.name()))
            .map(|f| module_dir.join(f));

        Ok(Self {
            key_alias: required(KEY_ALIAS)?,
            key_password: required(KEY_PASSWORD)?,
            store_file,
            store_password: required(STORE_PASSWORD)?,
        })
    }
}

/// Password-free view of a signing identity for reports
#[derive(Debug, Clone, Serialize)]
pub struct SigningSummary {
    /// Variant the identity belongs to
    pub variant: BuildType,
    /// Whether an identity was configured
    pub signed: bool,
    /// Key alias, when signed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_alias: Option<String>,
    /// Keystore path, when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_file: Option<PathBuf>,
    /// Whether the keystore file is on disk
    pub store_file_exists: bool,
}

/// Signing identities for the debug and release variants
#[derive(Debug, Clone, Default)]
pub struct SigningConfigs {
    debug: Option<SigningConfig>,
    release: Option<SigningConfig>,
    source: Option<PathBuf>,
}

impl SigningConfigs {
    /// Load signing identities from `properties_path`.
    ///
    /// A missing file is not an error: signing is skipped and both variants
    /// build unsigned. A file missing a required key is.
    pub fn load(properties_path: &Path, module_dir: &Path) -> Result<Self> {
        if !properties_path.exists() {
            tracing::warn!(
                path = %properties_path.display(),
                "No keystore properties at {}; signing configuration skipped",
                properties_path.display()
            );
            return Ok(Self::default());
        }

        let props = Properties::load(properties_path)?;
        let configs = Self {
            debug: Some(SigningConfig::from_properties(
                &props,
                BuildType::Debug,
                module_dir,
                properties_path,
            )?),
            release: Some(SigningConfig::from_properties(
                &props,
                BuildType::Release,
                module_dir,
                properties_path,
            )?),
            source: Some(properties_path.to_path_buf()),
        };

        tracing::info!(
            path = %properties_path.display(),
            "Loaded signing configuration for debug and release"
        );
        Ok(configs)
    }

    /// Signing identity for a variant
    #[must_use]
    pub fn get(&self, variant: BuildType) -> Option<&SigningConfig> {
        match variant {
            BuildType::Debug => self.debug.as_ref(),
            BuildType::Release => self.release.as_ref(),
        }
    }

    /// Whether no identity was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.debug.is_none() && self.release.is_none()
    }

    /// The properties file the identities came from
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Per-variant summaries without secrets
    #[must_use]
    pub fn summaries(&self) -> Vec<SigningSummary> {
        BuildType::ALL
            .into_iter()
            .map(|variant| {
                let config = self.get(variant);
                let store_file = config.and_then(|c| c.store_file.clone());
                SigningSummary {
                    variant,
                    signed: config.is_some(),
                    key_alias: config.map(|c| c.key_alias.clone()),
                    store_file_exists: store_file.as_deref().is_some_and(Path::exists),
                    store_file,
                }
            })
            .collect()
    }
}
