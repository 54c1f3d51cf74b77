use deunicode::deunicode_with_tofu;
use wikicodename_core::{TransformCase, Transforms};

/// Runs `value` through the transform pipeline of a profile.
///
/// Returns the first match of the validation pattern, or `None` when there
/// is no match or the match is empty.
pub fn apply_transforms(value: &str, transforms: &Transforms) -> Option<String> {
    let mut text = match transforms.case {
        TransformCase::Keep => value.to_string(),
        TransformCase::Lower => value.to_lowercase(),
        TransformCase::Upper => value.to_uppercase(),
    };

    if let Some(replacement) = &transforms.space {
        text = text
            .split(char::is_whitespace)
            .collect::<Vec<_>>()
            .join(replacement);
    }

    if transforms.unidecode {
        // characters without a transliteration are dropped
        text = deunicode_with_tofu(&text, "");
    }

    let matched = match &transforms.validation {
        Some(validation) => validation.find(&text)?.as_str(),
        None => text.split('\n').next().unwrap_or_default(),
    };
    (!matched.is_empty()).then(|| matched.to_string())
}

/// Whether `value` is non-empty and the validation pattern matches it.
/// Leaves `value` untouched, unlike [`apply_transforms`].
pub fn passes_validation(value: &str, transforms: &Transforms) -> bool {
    !value.is_empty()
        && transforms
            .validation
            .as_ref()
            .is_none_or(|validation| validation.is_match(value))
}
