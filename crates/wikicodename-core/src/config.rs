use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::profile::{Profile, ProfileKind, SourceSpec, Sources, TransformCase, Transforms};

/// Name of the profile generated when the caller does not pick one.
pub const MAIN_PROFILE: &str = "main";

const CONFIG_EXTENSION: &str = "toml";

const DEFAULT_FILES: &[(&str, &str)] = &[
    ("main.toml", include_str!("../defaults/main.toml")),
    ("adjective.toml", include_str!("../defaults/adjective.toml")),
    ("animal.toml", include_str!("../defaults/animal.toml")),
    ("color.toml", include_str!("../defaults/color.toml")),
    ("constellation.toml", include_str!("../defaults/constellation.toml")),
];

/// Read-only view of a loaded configuration consumed by the generator.
pub trait ConfigProvider: Send + Sync {
    fn wikipedia_url(&self) -> &str;
    fn excluded_sections(&self) -> &[String];
    /// Case-insensitive lookup.
    fn profile(&self, name: &str) -> Option<&Profile>;
    fn profile_names(&self) -> Vec<String>;
    /// Fingerprint that changes whenever any loaded value changes.
    fn version(&self) -> String;
}

/// Configuration loaded from a directory of TOML files or built in memory.
#[derive(Debug, Clone)]
pub struct Config {
    wikipedia_url: String,
    excluded_sections: Vec<String>,
    profiles: BTreeMap<String, Profile>,
}

impl Config {
    pub fn new(
        wikipedia_url: impl Into<String>,
        excluded_sections: Vec<String>,
        profiles: Vec<Profile>,
    ) -> Result<Self> {
        let mut config = Self {
            wikipedia_url: wikipedia_url.into(),
            excluded_sections,
            profiles: BTreeMap::new(),
        };
        for profile in profiles {
            config.insert(profile)?;
        }
        config.ensure_main()?;
        Ok(config)
    }

    /// Loads `main.toml` plus one leaf profile per other `.toml` file.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
        }

        let mut main: Option<MainFile> = None;
        let mut leaves = Vec::new();
        for path in config_files(dir)? {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "reading configuration file");
            if stem == MAIN_PROFILE {
                let parsed = toml::from_str::<MainFile>(&content)
                    .map_err(|err| ConfigError::Parse(err).in_file(path.clone()))?;
                main = Some(parsed);
            } else {
                let parsed = toml::from_str::<ListFile>(&content)
                    .map_err(|err| ConfigError::Parse(err).in_file(path.clone()))?;
                let profile = parsed
                    .into_profile(&stem)
                    .map_err(|err| err.in_file(path.clone()))?;
                leaves.push((path, profile));
            }
        }

        let main_path = dir.join(format!("{MAIN_PROFILE}.{CONFIG_EXTENSION}"));
        let main = main.ok_or(ConfigError::MissingMainProfile)?;
        let (wikipedia_url, excluded_sections, profiles) = main
            .into_parts()
            .map_err(|err| err.in_file(main_path.clone()))?;

        let mut config = Self {
            wikipedia_url,
            excluded_sections,
            profiles: BTreeMap::new(),
        };
        for profile in profiles {
            config
                .insert(profile)
                .map_err(|err| err.in_file(main_path.clone()))?;
        }
        for (path, profile) in leaves {
            config.insert(profile).map_err(|err| err.in_file(path))?;
        }
        config.ensure_main()?;

        info!(
            dir = %dir.display(),
            profiles = config.profiles.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Replaces every `.toml` file in `dir` with the bundled defaults.
    pub fn generate(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for path in config_files(dir)? {
            fs::remove_file(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        }
        for (file_name, content) in DEFAULT_FILES {
            let path = dir.join(file_name);
            fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })?;
        }
        info!(dir = %dir.display(), "default configuration written");
        Ok(())
    }

    fn insert(&mut self, mut profile: Profile) -> Result<()> {
        profile.name = profile.name.to_lowercase();
        if profile.name.is_empty() {
            return Err(ConfigError::MissingParameter("profile/name".to_string()));
        }
        if profile.name.contains('{') || profile.name.contains('}') {
            return Err(ConfigError::InvalidValue {
                parameter: "profile/name".to_string(),
                value: profile.name,
            });
        }
        if self.profiles.contains_key(&profile.name) {
            return Err(ConfigError::DuplicateProfile(profile.name));
        }
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    fn ensure_main(&self) -> Result<()> {
        if self.profiles.contains_key(MAIN_PROFILE) {
            Ok(())
        } else {
            Err(ConfigError::MissingMainProfile)
        }
    }
}

impl ConfigProvider for Config {
    fn wikipedia_url(&self) -> &str {
        &self.wikipedia_url
    }

    fn excluded_sections(&self) -> &[String] {
        &self.excluded_sections
    }

    fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(&name.to_lowercase())
    }

    fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    fn version(&self) -> String {
        let mut hasher = Sha256::new();
        feed(&mut hasher, &self.wikipedia_url);
        feed_list(&mut hasher, &self.excluded_sections);
        for profile in self.profiles.values() {
            feed(&mut hasher, &profile.name);
            feed(&mut hasher, &profile.pattern);
            let transforms = &profile.transforms;
            feed(&mut hasher, transforms.case.as_str());
            feed(&mut hasher, transforms.space.as_deref().unwrap_or("\u{0}false"));
            feed(&mut hasher, if transforms.unidecode { "true" } else { "false" });
            feed(
                &mut hasher,
                transforms
                    .validation
                    .as_ref()
                    .map(Regex::as_str)
                    .unwrap_or(""),
            );
            match &profile.kind {
                ProfileKind::Composite => feed(&mut hasher, "composite"),
                ProfileKind::Leaf(source) => {
                    feed(&mut hasher, "leaf");
                    feed(&mut hasher, source.wikipedia_url.as_deref().unwrap_or(""));
                    match &source.excluded_sections {
                        Some(sections) => feed_list(&mut hasher, sections),
                        None => feed(&mut hasher, "\u{0}inherit"),
                    }
                    feed_list(&mut hasher, &source.pages);
                    feed(&mut hasher, if source.sources.lists { "lists" } else { "" });
                    feed_list(&mut hasher, &source.sources.tables);
                }
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn feed(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn feed_list(hasher: &mut Sha256, values: &[String]) {
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        feed(hasher, value);
    }
}

fn config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_config = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(CONFIG_EXTENSION))
            .unwrap_or(false);
        if path.is_file() && is_config {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct MainFile {
    wikipedia_url: Option<String>,
    excluded_sections: Option<Vec<String>>,
    profile: Option<Vec<RawProfile>>,
}

impl MainFile {
    fn into_parts(self) -> Result<(String, Vec<String>, Vec<Profile>)> {
        let wikipedia_url = non_empty(self.wikipedia_url)
            .ok_or_else(|| ConfigError::MissingParameter("wikipedia_url".to_string()))?;
        let raw_profiles = self
            .profile
            .ok_or_else(|| ConfigError::MissingParameter("profile".to_string()))?;

        let mut profiles = Vec::with_capacity(raw_profiles.len());
        for raw in raw_profiles {
            let name = non_empty(raw.name)
                .ok_or_else(|| ConfigError::MissingParameter("profile/name".to_string()))?
                .to_lowercase();
            let pattern = non_empty(raw.pattern)
                .ok_or_else(|| ConfigError::MissingParameter("profile/pattern".to_string()))?;
            let transforms = raw.transforms.into_transforms(&name)?;
            profiles.push(Profile::composite(name, pattern).with_transforms(transforms));
        }

        Ok((
            wikipedia_url,
            self.excluded_sections.unwrap_or_default(),
            profiles,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    name: Option<String>,
    pattern: Option<String>,
    #[serde(flatten)]
    transforms: RawTransforms,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransforms {
    transform_case: Option<String>,
    transform_space: Option<SpaceSetting>,
    transform_unidecode: Option<bool>,
    validation_pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpaceSetting {
    Flag(bool),
    Replace(String),
}

impl RawTransforms {
    fn into_transforms(self, profile: &str) -> Result<Transforms> {
        let case = match non_empty(self.transform_case).as_deref() {
            None | Some("keep") => TransformCase::Keep,
            Some("lower") => TransformCase::Lower,
            Some("upper") => TransformCase::Upper,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    parameter: "profile/transform_case".to_string(),
                    value: other.to_string(),
                });
            }
        };
        let space = match self.transform_space {
            None | Some(SpaceSetting::Flag(false)) => None,
            Some(SpaceSetting::Flag(true)) => {
                return Err(ConfigError::InvalidValue {
                    parameter: "profile/transform_space".to_string(),
                    value: "true".to_string(),
                });
            }
            Some(SpaceSetting::Replace(replacement)) => non_empty(Some(replacement)),
        };
        let validation = match non_empty(self.validation_pattern) {
            Some(pattern) => {
                Some(Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex {
                    profile: profile.to_string(),
                    source,
                })?)
            }
            None => None,
        };
        Ok(Transforms {
            case,
            space,
            unidecode: self.transform_unidecode.unwrap_or(false),
            validation,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListFile {
    wikipedia_url: Option<String>,
    excluded_sections: Option<Vec<String>>,
    pages: Option<Vec<String>>,
    sources: Option<RawSources>,
    profile: Option<RawTransforms>,
}

#[derive(Debug, Deserialize)]
struct RawSources {
    #[serde(default)]
    lists: bool,
    #[serde(default)]
    tables: Vec<String>,
}

impl ListFile {
    fn into_profile(self, name: &str) -> Result<Profile> {
        let pages = self
            .pages
            .ok_or_else(|| ConfigError::MissingParameter("pages".to_string()))?;
        let sources = self
            .sources
            .ok_or_else(|| ConfigError::MissingParameter("sources".to_string()))?;
        let transforms = self.profile.unwrap_or_default().into_transforms(name)?;
        let source = SourceSpec {
            wikipedia_url: non_empty(self.wikipedia_url),
            excluded_sections: self.excluded_sections.filter(|list| !list.is_empty()),
            pages,
            sources: Sources {
                lists: sources.lists,
                tables: sources.tables,
            },
        };
        Ok(Profile::leaf(name, source).with_transforms(transforms))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_transforms_apply_defaults() {
        let transforms = RawTransforms::default()
            .into_transforms("animal")
            .expect("defaults");
        assert_eq!(transforms.case, TransformCase::Keep);
        assert!(transforms.space.is_none());
        assert!(!transforms.unidecode);
        assert!(transforms.validation.is_none());
    }

    #[test]
    fn empty_space_replacement_disables_the_transform() {
        let raw = RawTransforms {
            transform_space: Some(SpaceSetting::Replace(String::new())),
            ..RawTransforms::default()
        };
        let transforms = raw.into_transforms("animal").expect("transforms");
        assert!(transforms.space.is_none());
    }

    #[test]
    fn space_flag_true_is_rejected() {
        let raw = RawTransforms {
            transform_space: Some(SpaceSetting::Flag(true)),
            ..RawTransforms::default()
        };
        let err = raw.into_transforms("animal").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn unknown_case_is_rejected() {
        let raw = RawTransforms {
            transform_case: Some("title".to_string()),
            ..RawTransforms::default()
        };
        let err = raw.into_transforms("animal").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref parameter, .. } if parameter == "profile/transform_case"
        ));
    }

    #[test]
    fn version_tracks_profile_changes() {
        let base = Config::new(
            "https://en.wikipedia.org/",
            vec!["References".to_string()],
            vec![Profile::composite("main", "{animal}")],
        )
        .expect("config");
        let changed = Config::new(
            "https://en.wikipedia.org/",
            vec!["References".to_string()],
            vec![Profile::composite("main", "{animal}-{color}")],
        )
        .expect("config");

        assert_eq!(base.version(), base.clone().version());
        assert_ne!(base.version(), changed.version());
        assert_eq!(base.version().len(), 64);
    }

    #[test]
    fn profile_lookup_is_case_insensitive() {
        let config = Config::new(
            "https://en.wikipedia.org/",
            Vec::new(),
            vec![Profile::composite("Main", "{animal}")],
        )
        .expect("config");
        assert!(config.profile("MAIN").is_some());
        assert_eq!(config.profile_names(), vec!["main".to_string()]);
    }
}
