//! Android build tooling for Flutter projects
//!
//! This crate provides:
//! - Artifact collection from Gradle output directories
//! - Keystore properties loading and per-build-type signing identities
//! - Named post-build tasks with Gradle task dependencies
//! - Gradle wrapper integration

#![warn(missing_docs)]

pub mod artifacts;
pub mod build_config;
pub mod gradle;
pub mod signing;
pub mod tasks;

pub use artifacts::{collect, ArtifactCollector, ArtifactKind, CollectionResult};
pub use build_config::{BuildConfiguration, BuildType};
pub use signing::{SigningConfig, SigningConfigs};
pub use tasks::{CollectTask, GradleRunner, TaskRegistry, TaskRunner};
