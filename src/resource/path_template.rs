//! Path Templates
//!
//! Resource names are `/`-separated sequences of literal collection ids and
//! variable resource ids, e.g. `projects/{project}/dlpJobs/{dlp_job}`.
//! A [`PathTemplate`] renders such names from a [`Binding`] and matches
//! concrete names back into one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;

/// Separator between resource name segments
pub const SEPARATOR: char = '/';

/// Placeholder name -> value
pub type Binding = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed, immutable resource name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template pattern such as `projects/{project}`
    pub fn new(pattern: &str) -> Result<Self, TemplateError> {
        let invalid = |reason: &str| TemplateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for raw in pattern.split(SEPARATOR) {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }

            if let Some(inner) = raw.strip_prefix('{') {
                let Some(name) = inner.strip_suffix('}') else {
                    return Err(invalid("unterminated placeholder"));
                };
                if name.is_empty()
                    || !name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(invalid("placeholder names must be [A-Za-z0-9_]+"));
                }
                if seen.contains(&name) {
                    return Err(invalid("duplicate placeholder"));
                }
                seen.push(name);
                segments.push(Segment::Placeholder(name.to_string()));
            } else {
                if raw.contains('{') || raw.contains('}') {
                    return Err(invalid("braces are only allowed around a whole segment"));
                }
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// The pattern this template was parsed from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in declaration order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn declares(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Render a resource name. The binding must cover exactly the
    /// template's placeholders.
    pub fn render(&self, bindings: &Binding) -> Result<String, TemplateError> {
        for name in self.placeholders() {
            if !bindings.contains_key(name) {
                return Err(TemplateError::MissingBinding(name.to_string()));
            }
        }
        if let Some(extra) = bindings.keys().find(|k| !self.declares(k)) {
            return Err(TemplateError::UnknownBinding(extra.clone()));
        }

        let mut parts: Vec<&str> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(text),
                Segment::Placeholder(name) => {
                    // presence checked above
                    let value = bindings.get(name).map(String::as_str).unwrap_or_default();
                    if value.is_empty() || value.contains(SEPARATOR) {
                        return Err(TemplateError::InvalidValue {
                            name: name.clone(),
                            value: value.to_string(),
                        });
                    }
                    parts.push(value);
                },
            }
        }

        Ok(parts.join("/"))
    }

    /// Render from `(name, value)` pairs
    pub fn render_pairs<'a, I>(&self, pairs: I) -> Result<String, TemplateError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let bindings: Binding = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.render(&bindings)
    }

    /// Match a concrete resource name, capturing every placeholder
    pub fn matches(&self, candidate: &str) -> Result<Binding, TemplateError> {
        let mismatch = || TemplateError::Mismatch {
            template: self.pattern.clone(),
            candidate: candidate.to_string(),
        };

        let parts: Vec<&str> = candidate.split(SEPARATOR).collect();
        if parts.len() != self.segments.len() {
            return Err(mismatch());
        }

        let mut binding = Binding::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) if text == part => {},
                Segment::Literal(_) => return Err(mismatch()),
                Segment::Placeholder(_) if part.is_empty() => return Err(mismatch()),
                Segment::Placeholder(name) => {
                    binding.insert(name.clone(), part.to_string());
                },
            }
        }

        Ok(binding)
    }

    /// Whether `candidate` fits this template
    pub fn is_match(&self, candidate: &str) -> bool {
        self.matches(candidate).is_ok()
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
