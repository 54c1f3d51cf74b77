use thiserror::Error;
use wikicodename_cache::StorageError;
use wikicodename_wiki::FetchError;

/// Broad category of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misconfigured profile; retrying cannot help.
    Configuration,
    /// Attempt budget spent without enough valid values.
    Exhausted,
    Storage,
    Fetch,
}

/// Errors emitted while generating code names. Each carries the profile it
/// was raised for.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(
        "could not generate code names for the profile '{profile}': the profile is not defined"
    )]
    UnknownProfile { profile: String },
    #[error(
        "could not generate code names for the profile '{profile}': the profile does not define a list of code names"
    )]
    MissingSource { profile: String },
    #[error(
        "could not generate code names for the profile '{profile}': no code name matches the profile"
    )]
    EmptySource { profile: String },
    #[error(
        "could not generate code names for the profile '{profile}': the pattern does not contain any profile: {pattern}"
    )]
    NoPlaceholder { profile: String, pattern: String },
    #[error(
        "could not generate code names for the profile '{profile}': the pattern must not contain its own profile: {pattern}"
    )]
    SelfReference { profile: String, pattern: String },
    #[error(
        "could not generate code names for the profile '{profile}': the sampled code name does not match the validation pattern"
    )]
    Rejected { profile: String },
    #[error(
        "could not generate code names for the profile '{profile}': the maximum number of attempts has been reached ({attempts})"
    )]
    AttemptsExhausted { profile: String, attempts: usize },
    #[error(
        "could not generate code names for the profile '{profile}': the cached list of code names is corrupt"
    )]
    CorruptCacheEntry {
        profile: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not generate code names for the profile '{profile}': cache failure")]
    Storage {
        profile: String,
        #[source]
        source: StorageError,
    },
    #[error("could not generate code names for the profile '{profile}': fetch failure")]
    Fetch {
        profile: String,
        #[source]
        source: FetchError,
    },
}

impl GenerationError {
    pub fn profile(&self) -> &str {
        match self {
            GenerationError::UnknownProfile { profile }
            | GenerationError::MissingSource { profile }
            | GenerationError::EmptySource { profile }
            | GenerationError::NoPlaceholder { profile, .. }
            | GenerationError::SelfReference { profile, .. }
            | GenerationError::Rejected { profile }
            | GenerationError::AttemptsExhausted { profile, .. }
            | GenerationError::CorruptCacheEntry { profile, .. }
            | GenerationError::Storage { profile, .. }
            | GenerationError::Fetch { profile, .. } => profile,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::UnknownProfile { .. }
            | GenerationError::MissingSource { .. }
            | GenerationError::EmptySource { .. }
            | GenerationError::NoPlaceholder { .. }
            | GenerationError::SelfReference { .. } => ErrorKind::Configuration,
            GenerationError::Rejected { .. } | GenerationError::AttemptsExhausted { .. } => {
                ErrorKind::Exhausted
            }
            GenerationError::CorruptCacheEntry { .. } | GenerationError::Storage { .. } => {
                ErrorKind::Storage
            }
            GenerationError::Fetch { .. } => ErrorKind::Fetch,
        }
    }
}

/// Result type for generation.
pub type Result<T> = std::result::Result<T, GenerationError>;
