//! # stepkit Core
//!
//! Shared building blocks for the stepkit step-definition support crates.
//!
//! ## What lives here
//! - The error taxonomy every stepkit crate reports through
//! - The spin primitive that makes assertions tolerant of asynchronous UI updates
//! - Configuration types with environment overrides

pub mod config;
pub mod error;
pub mod spinner;

pub use config::SpinnerConfig;
pub use error::{Dimension, Result, StepKitError};
pub use spinner::{SpinTimeout, Spinner};

/// Current stepkit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information for logs and `--version` output
pub const BUILD_INFO: &str = concat!(
    "stepkit ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);
