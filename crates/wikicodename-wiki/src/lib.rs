//! Wiki page fetching and table/list extraction.
//!
//! `WikiFetcher` pulls every non-excluded section of a page through the
//! MediaWiki parse API, caching each response, and parses the rendered markup
//! into `PageContent`.

pub mod api;
pub mod content;
pub mod error;
pub mod fetcher;
pub mod transport;

pub use content::{ListBlock, PageContent, TableBlock, parse_section};
pub use error::{FetchError, Result, TransportError};
pub use fetcher::{DEFAULT_MAX_WORKERS, WikiFetcher};
pub use transport::{DEFAULT_TIMEOUT, HttpTransport, WikiTransport};
