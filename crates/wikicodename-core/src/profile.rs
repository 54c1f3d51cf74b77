use regex::Regex;

/// Case folding applied before any other transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransformCase {
    #[default]
    Keep,
    Lower,
    Upper,
}

impl TransformCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformCase::Keep => "keep",
            TransformCase::Lower => "lower",
            TransformCase::Upper => "upper",
        }
    }
}

/// Text transforms and the validation pattern of a profile.
///
/// Applied in field order: case, space replacement, transliteration, then the
/// validation pattern whose first match becomes the final value.
#[derive(Debug, Clone, Default)]
pub struct Transforms {
    pub case: TransformCase,
    /// Replacement for every whitespace character; `None` keeps whitespace.
    pub space: Option<String>,
    pub unidecode: bool,
    /// `None` behaves like `.*`: the first line is accepted as is.
    pub validation: Option<Regex>,
}

/// Which content blocks of the fetched pages feed a leaf profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    pub lists: bool,
    /// Column headers whose cells are collected from every table.
    pub tables: Vec<String>,
}

/// Data source of a leaf profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    /// Overrides the configuration-wide wiki URL.
    pub wikipedia_url: Option<String>,
    /// Overrides the configuration-wide excluded section titles.
    pub excluded_sections: Option<Vec<String>>,
    pub pages: Vec<String>,
    pub sources: Sources,
}

/// Shape of a profile.
#[derive(Debug, Clone)]
pub enum ProfileKind {
    /// Combines other profiles through its pattern.
    Composite,
    /// Backed by a list fetched from wiki pages.
    Leaf(SourceSpec),
}

/// Named generation profile. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Lowercased, unique within a configuration.
    pub name: String,
    pub pattern: String,
    pub transforms: Transforms,
    pub kind: ProfileKind,
}

impl Profile {
    pub fn composite(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            pattern: pattern.into(),
            transforms: Transforms::default(),
            kind: ProfileKind::Composite,
        }
    }

    /// Leaf profile whose pattern is its own placeholder.
    pub fn leaf(name: impl Into<String>, source: SourceSpec) -> Self {
        let name = name.into().to_lowercase();
        Self {
            pattern: format!("{{{name}}}"),
            name,
            transforms: Transforms::default(),
            kind: ProfileKind::Leaf(source),
        }
    }

    pub fn with_transforms(mut self, transforms: Transforms) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn source(&self) -> Option<&SourceSpec> {
        match &self.kind {
            ProfileKind::Leaf(source) => Some(source),
            ProfileKind::Composite => None,
        }
    }
}
