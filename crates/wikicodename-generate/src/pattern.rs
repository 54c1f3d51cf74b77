//! `{name}` placeholder patterns.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot,
}

/// A pattern split into literal text and placeholder slots.
///
/// Parsing is lenient: an opening brace without a closing one is kept as
/// literal text, and nothing inside a placeholder is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    format_pattern: String,
    profiles: Vec<String>,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let mut format_pattern = String::with_capacity(pattern.len());
        let mut profiles = Vec::new();
        let mut segments = Vec::new();

        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let literal = &rest[..open];
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }
            segments.push(Segment::Slot);
            profiles.push(after[..close].to_string());
            format_pattern.push_str(literal);
            format_pattern.push_str("{}");
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        format_pattern.push_str(rest);

        Self {
            format_pattern,
            profiles,
            segments,
        }
    }

    /// The pattern with every placeholder replaced by `{}`.
    pub fn format_pattern(&self) -> &str {
        &self.format_pattern
    }

    /// Placeholder names in order of appearance, duplicates included.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Substitutes `values` into the slots positionally. Missing values
    /// render as empty text.
    pub fn render(&self, values: &[String]) -> String {
        let mut values = values.iter();
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Slot => {
                    if let Some(value) = values.next() {
                        rendered.push_str(value);
                    }
                }
            }
        }
        rendered
    }
}
