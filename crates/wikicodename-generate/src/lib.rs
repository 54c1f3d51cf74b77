//! Code name generation for wikicodename.
//!
//! Profiles are resolved recursively: composite patterns substitute the
//! values of other profiles, leaf profiles sample from a list built out of
//! wiki tables and lists. Every attempt is bounded.

pub mod errors;
pub mod generator;
pub mod lists;
pub mod pattern;
pub mod transform;

pub use errors::{ErrorKind, GenerationError, Result};
pub use generator::{DEFAULT_MAX_ATTEMPT_COUNT, Generator, GeneratorOptions};
pub use pattern::Pattern;
pub use transform::{apply_transforms, passes_validation};
