//! Core utilities for droidship
//!
//! Shared functionality used by the Android tooling crate and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with validation
//! - **Properties**: `java.util.Properties`-compatible file parsing
//! - **Filesystem**: directory walking and copying with path-aware errors
//! - **Process execution**: running external commands in a directory
//! - **Health checks**: verify tool dependencies and environment
//!
//! # Example
//!
//! ```rust,no_run
//! use droidship_core::config::Config;
//! use droidship_core::properties::Properties;
//!
//! let config = Config::load(None).expect("invalid config");
//! let android_dir = config.android_dir(None);
//! let props = Properties::load(&android_dir.join("key.properties"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod fs;
pub mod health;
pub mod process;
pub mod properties;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::health::{HealthChecker, HealthReport, HealthStatus};
    pub use crate::properties::Properties;
}
