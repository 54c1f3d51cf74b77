use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. These are never retried by the generator.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration directory is absent.
    #[error("the configuration directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    /// Filesystem failure while reading or writing configuration.
    #[error("configuration i/o failed for {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not fit the expected layout.
    #[error("the file syntax is invalid")]
    Parse(#[source] toml::de::Error),
    #[error("the parameter is missing: {0}")]
    MissingParameter(String),
    #[error("the value is not allowed for the '{parameter}' parameter: {value}")]
    InvalidValue { parameter: String, value: String },
    #[error("the profile is already defined: {0}")]
    DuplicateProfile(String),
    #[error("the 'main' profile is not defined")]
    MissingMainProfile,
    #[error("the validation pattern of the profile '{profile}' is invalid")]
    InvalidRegex {
        profile: String,
        #[source]
        source: regex::Error,
    },
    /// Any of the above, attributed to the file it came from.
    #[error("could not load the configuration file {}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    pub(crate) fn in_file(self, path: PathBuf) -> Self {
        match self {
            ConfigError::InFile { .. } | ConfigError::Io { .. } => self,
            other => ConfigError::InFile {
                path,
                source: Box::new(other),
            },
        }
    }
}

/// Convenience alias for configuration results.
pub type Result<T> = std::result::Result<T, ConfigError>;
