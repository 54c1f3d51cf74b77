use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};
use wikicodename_cache::KeyValueCache;

use crate::api::{decode_section_list, decode_section_text, section_list_url, section_url};
use crate::content::{PageContent, parse_section};
use crate::error::{FetchError, Result};
use crate::transport::WikiTransport;

/// Concurrent section fetches per page.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Cache-first page fetcher.
#[derive(Clone)]
pub struct WikiFetcher {
    cache: Arc<dyn KeyValueCache>,
    transport: Arc<dyn WikiTransport>,
    wikipedia_url: String,
    max_workers: usize,
}

impl WikiFetcher {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        transport: Arc<dyn WikiTransport>,
        wikipedia_url: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            transport,
            wikipedia_url: wikipedia_url.into(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Fetches every section of `page` whose title is not excluded and parses
    /// its tables and lists.
    ///
    /// Sections are fetched concurrently and absorbed in completion order, so
    /// block indices are not stable across runs. The first failing section
    /// aborts the call; requests still in flight are dropped.
    pub async fn fetch(
        &self,
        page: &str,
        excluded_sections: &[String],
        wikipedia_url: Option<&str>,
    ) -> Result<PageContent> {
        let base = wikipedia_url.unwrap_or(&self.wikipedia_url);
        let sections = self.fetch_section_list(page, base).await?;
        let selected: Vec<u32> = sections
            .into_iter()
            .filter(|(_, title)| !excluded_sections.iter().any(|excluded| excluded == title))
            .map(|(index, _)| index)
            .collect();
        let dispatched = selected.len();

        let mut pending = stream::iter(selected)
            .map(|index| self.fetch_section(page, index, base))
            .buffer_unordered(self.max_workers);

        let mut content = PageContent::default();
        while let Some(markup) = pending.next().await {
            content.absorb(parse_section(&markup?));
        }

        info!(
            page,
            sections = dispatched,
            tables = content.table_count(),
            lists = content.list_count(),
            "page fetched"
        );
        Ok(content)
    }

    async fn fetch_section_list(&self, page: &str, base: &str) -> Result<Vec<(u32, String)>> {
        let url = section_list_url(base, page)?;
        if let Some(cached) = self.read_cache(page, &url)? {
            debug!(page, "section list cache hit");
            return serde_json::from_str(&cached).map_err(|source| FetchError::Decode {
                page: page.to_string(),
                source,
            });
        }

        let body = self.get(page, &url).await?;
        let sections = decode_section_list(page, &body)?;
        let encoded = serde_json::to_string(&sections).map_err(|source| FetchError::Decode {
            page: page.to_string(),
            source,
        })?;
        self.write_cache(page, &url, &encoded)?;
        Ok(sections)
    }

    async fn fetch_section(&self, page: &str, index: u32, base: &str) -> Result<String> {
        let url = section_url(base, page, index)?;
        if let Some(cached) = self.read_cache(page, &url)? {
            debug!(page, section = index, "section cache hit");
            return Ok(cached);
        }

        debug!(page, section = index, "fetching section");
        let body = self.get(page, &url).await?;
        let markup = decode_section_text(page, &body)?;
        self.write_cache(page, &url, &markup)?;
        Ok(markup)
    }

    async fn get(&self, page: &str, url: &str) -> Result<String> {
        self.transport
            .get(url)
            .await
            .map_err(|source| FetchError::Transport {
                page: page.to_string(),
                url: url.to_string(),
                source,
            })
    }

    /// Empty entries count as misses.
    fn read_cache(&self, page: &str, key: &str) -> Result<Option<String>> {
        let cached = self.cache.read(key).map_err(|source| FetchError::Cache {
            page: page.to_string(),
            source,
        })?;
        Ok(cached.filter(|data| !data.is_empty()))
    }

    fn write_cache(&self, page: &str, key: &str, data: &str) -> Result<()> {
        self.cache.write(key, data).map_err(|source| FetchError::Cache {
            page: page.to_string(),
            source,
        })
    }
}
