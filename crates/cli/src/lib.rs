//! Terminal helpers for the droidship CLI
//!
//! - Status lines with consistent symbols and colors
//! - Human-readable sizes, durations and counts
//! - Spinners for long-running Gradle invocations

#![warn(missing_docs)]

pub mod output;
pub mod progress;
