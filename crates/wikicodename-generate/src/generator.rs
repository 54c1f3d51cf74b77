use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use wikicodename_cache::KeyValueCache;
use wikicodename_core::{ConfigProvider, Profile};
use wikicodename_wiki::{FetchError, WikiFetcher};

use crate::errors::{GenerationError, Result};
use crate::lists::collect_candidates;
use crate::pattern::Pattern;
use crate::transform::{apply_transforms, passes_validation};

/// Attempts allowed per placeholder resolution and per batch.
pub const DEFAULT_MAX_ATTEMPT_COUNT: usize = 64;

const PROFILE_CACHE_PREFIX: &str = "profile_";

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub max_attempt_count: usize,
    /// Fixed seed for reproducible sampling; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_attempt_count: DEFAULT_MAX_ATTEMPT_COUNT,
            seed: None,
        }
    }
}

/// Resolves profiles into code names.
///
/// The backing list of a leaf profile is built once per cache lifetime and
/// kept in memory for the lifetime of the generator.
pub struct Generator {
    config: Arc<dyn ConfigProvider>,
    cache: Arc<dyn KeyValueCache>,
    fetcher: WikiFetcher,
    max_attempt_count: usize,
    rng: ChaCha8Rng,
    lists: HashMap<String, Arc<Vec<String>>>,
}

impl Generator {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        cache: Arc<dyn KeyValueCache>,
        fetcher: WikiFetcher,
        options: GeneratorOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self {
            config,
            cache,
            fetcher,
            max_attempt_count: options.max_attempt_count,
            rng,
            lists: HashMap::new(),
        }
    }

    /// Generates `count` distinct code names for `profile`.
    ///
    /// Duplicates and rejected values consume attempts. Partial results are
    /// discarded when the attempt budget runs out.
    pub async fn generate(&mut self, profile: &str, count: usize) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::with_capacity(count);
        let mut attempts = 0;
        while names.len() < count && attempts < self.max_attempt_count {
            attempts += 1;
            match self.resolve_value(profile).await? {
                Some(name) if !names.contains(&name) => names.push(name),
                Some(name) => debug!(profile, name = %name, "duplicate code name"),
                None => debug!(profile, "code name rejected"),
            }
        }

        if names.len() < count {
            return Err(GenerationError::AttemptsExhausted {
                profile: profile.to_string(),
                attempts,
            });
        }
        info!(profile, count, attempts, "code names generated");
        Ok(names)
    }

    /// Resolves a single code name for `profile`.
    pub async fn resolve(&mut self, profile: &str) -> Result<String> {
        self.resolve_value(profile)
            .await?
            .ok_or_else(|| GenerationError::Rejected {
                profile: profile.to_string(),
            })
    }

    /// Every transformed value backing a leaf profile.
    pub async fn generate_all(&mut self, profile: &str) -> Result<Vec<String>> {
        let config = Arc::clone(&self.config);
        let profile = config
            .profile(profile)
            .ok_or_else(|| GenerationError::UnknownProfile {
                profile: profile.to_string(),
            })?;
        let list = self.code_name_list(profile).await?;
        Ok(list.to_vec())
    }

    /// `None` when a sampled leaf value fails its validation pattern; every
    /// composite level retries that on its own budget.
    fn resolve_value<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        async move {
            let config = Arc::clone(&self.config);
            let profile = config
                .profile(name)
                .ok_or_else(|| GenerationError::UnknownProfile {
                    profile: name.to_string(),
                })?;
            let pattern = Pattern::parse(&profile.pattern);

            match pattern.profiles() {
                [] => Err(GenerationError::NoPlaceholder {
                    profile: profile.name.clone(),
                    pattern: profile.pattern.clone(),
                }),
                [single] if single.to_lowercase() == profile.name => {
                    let list = self.code_name_list(profile).await?;
                    if list.is_empty() {
                        return Err(GenerationError::EmptySource {
                            profile: profile.name.clone(),
                        });
                    }
                    // entries went through the pipeline when the list was built
                    let sampled = &list[self.rng.random_range(0..list.len())];
                    Ok(passes_validation(sampled, &profile.transforms).then(|| sampled.clone()))
                }
                [single] => {
                    for _ in 0..self.max_attempt_count {
                        let Some(value) = self.resolve_value(single).await? else {
                            continue;
                        };
                        let rendered = pattern.render(&[value]);
                        if let Some(name) = apply_transforms(&rendered, &profile.transforms) {
                            return Ok(Some(name));
                        }
                    }
                    Err(self.exhausted(profile))
                }
                several => {
                    if several
                        .iter()
                        .any(|placeholder| placeholder.to_lowercase() == profile.name)
                    {
                        return Err(GenerationError::SelfReference {
                            profile: profile.name.clone(),
                            pattern: profile.pattern.clone(),
                        });
                    }
                    'attempts: for _ in 0..self.max_attempt_count {
                        let mut values = Vec::with_capacity(several.len());
                        for placeholder in several {
                            match self.resolve_value(placeholder).await? {
                                Some(value) => values.push(value),
                                None => continue 'attempts,
                            }
                        }
                        let rendered = pattern.render(&values);
                        if let Some(name) = apply_transforms(&rendered, &profile.transforms) {
                            return Ok(Some(name));
                        }
                    }
                    Err(self.exhausted(profile))
                }
            }
        }
        .boxed()
    }

    fn exhausted(&self, profile: &Profile) -> GenerationError {
        GenerationError::AttemptsExhausted {
            profile: profile.name.clone(),
            attempts: self.max_attempt_count,
        }
    }

    /// Loads the backing list of a leaf profile from memory, then the cache,
    /// then the wiki.
    async fn code_name_list(&mut self, profile: &Profile) -> Result<Arc<Vec<String>>> {
        if let Some(list) = self.lists.get(&profile.name) {
            return Ok(Arc::clone(list));
        }

        let key = format!("{PROFILE_CACHE_PREFIX}{}", profile.name);
        let cached = self
            .cache
            .read(&key)
            .map_err(|source| GenerationError::Storage {
                profile: profile.name.clone(),
                source,
            })?
            .filter(|data| !data.is_empty());

        let list = match cached {
            Some(data) => {
                debug!(profile = %profile.name, "code name list cache hit");
                serde_json::from_str(&data).map_err(|source| {
                    GenerationError::CorruptCacheEntry {
                        profile: profile.name.clone(),
                        source,
                    }
                })?
            }
            None => {
                let list = self.fetch_code_name_list(profile).await?;
                let encoded = serde_json::to_string(&list).map_err(|source| {
                    GenerationError::CorruptCacheEntry {
                        profile: profile.name.clone(),
                        source,
                    }
                })?;
                self.cache
                    .write(&key, &encoded)
                    .map_err(|source| GenerationError::Storage {
                        profile: profile.name.clone(),
                        source,
                    })?;
                list
            }
        };

        let list = Arc::new(list);
        self.lists.insert(profile.name.clone(), Arc::clone(&list));
        Ok(list)
    }

    async fn fetch_code_name_list(&self, profile: &Profile) -> Result<Vec<String>> {
        let leaf = profile
            .source()
            .ok_or_else(|| GenerationError::MissingSource {
                profile: profile.name.clone(),
            })?;
        let wikipedia_url = leaf
            .wikipedia_url
            .as_deref()
            .unwrap_or_else(|| self.config.wikipedia_url());
        let excluded_sections = leaf
            .excluded_sections
            .as_deref()
            .unwrap_or_else(|| self.config.excluded_sections());

        let mut names = Vec::new();
        for (index, page) in leaf.pages.iter().enumerate() {
            info!(
                profile = %profile.name,
                page = %page,
                current = index + 1,
                total = leaf.pages.len(),
                "fetching code names"
            );
            let content = self
                .fetcher
                .fetch(page, excluded_sections, Some(wikipedia_url))
                .await
                .map_err(|err| match err {
                    FetchError::Cache { source, .. } => GenerationError::Storage {
                        profile: profile.name.clone(),
                        source,
                    },
                    source => GenerationError::Fetch {
                        profile: profile.name.clone(),
                        source,
                    },
                })?;
            names.extend(
                collect_candidates(&content, &leaf.sources)
                    .iter()
                    .filter_map(|value| apply_transforms(value, &profile.transforms)),
            );
        }

        info!(profile = %profile.name, count = names.len(), "code name list built");
        Ok(names)
    }
}
