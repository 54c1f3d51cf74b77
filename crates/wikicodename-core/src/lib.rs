//! Core contracts for wikicodename.
//!
//! This crate defines the profile model consumed by the generator, the
//! `ConfigProvider` seam, and the TOML directory loader used by the CLI.

pub mod config;
pub mod error;
pub mod profile;

pub use config::{Config, ConfigProvider, MAIN_PROFILE};
pub use error::{ConfigError, Result};
pub use profile::{Profile, ProfileKind, SourceSpec, Sources, TransformCase, Transforms};

/// Wiki instance used when a configuration does not override it.
pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/";
