use thiserror::Error;
use wikicodename_cache::StorageError;

/// Failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {status}")]
    Status { status: u16 },
}

/// Errors raised while fetching a page. Never retried at this layer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid wiki url: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not fetch the page {page}: request to {url} failed")]
    Transport {
        page: String,
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("could not fetch the page {page}: the response is not a valid JSON text")]
    Decode {
        page: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not fetch the page {page}: wiki API: {info}")]
    Remote { page: String, info: String },
    #[error("could not fetch the page {page}: the response has an unexpected format")]
    UnexpectedFormat { page: String },
    #[error("could not fetch the page {page}: cache failure")]
    Cache {
        page: String,
        #[source]
        source: StorageError,
    },
}

impl FetchError {
    /// Page the failure belongs to, when known.
    pub fn page(&self) -> Option<&str> {
        match self {
            FetchError::InvalidUrl { .. } => None,
            FetchError::Transport { page, .. }
            | FetchError::Decode { page, .. }
            | FetchError::Remote { page, .. }
            | FetchError::UnexpectedFormat { page }
            | FetchError::Cache { page, .. } => Some(page),
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
