//! Front matter detection and parsing.
//!
//! An entry may start with a metadata block fenced by delimiter lines:
//!
//! ```text
//! ---                 +++
//! title: Morning      title = "Morning"
//! ---                 +++
//! body...             body...
//! ```
//!
//! `---` is YAML, `+++` is TOML. Leading whitespace before the opening
//! fence is tolerated. A file without an opening fence has no front matter.

use serde_json::{Map, Value};
use thiserror::Error;

/// Metadata block syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    const fn delimiter(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn detect(first_line: &str) -> Option<Self> {
        match first_line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter opened with `{0}` is never closed")]
    Unterminated(&'static str),

    #[error("invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML front matter: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotMapping,
}

/// Raw metadata block, not yet parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrontMatter<'a> {
    pub format: Format,
    pub text: &'a str,
}

/// A file split into its metadata block and markdown body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub front: Option<RawFrontMatter<'a>>,
    pub body: &'a str,
}

/// Separate the front matter block from the body.
pub fn split(content: &str) -> Result<Split<'_>, FrontMatterError> {
    let trimmed = content.trim_start();
    let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));

    let Some(format) = Format::detect(first_line) else {
        return Ok(Split {
            front: None,
            body: content,
        });
    };

    let delimiter = format.delimiter();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let body = &rest[offset + line.len()..];
            return Ok(Split {
                front: Some(RawFrontMatter {
                    format,
                    text: &rest[..offset],
                }),
                body: body.trim_start_matches(['\r', '\n']),
            });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated(delimiter))
}

/// Parse a metadata block into a JSON object.
///
/// An empty block (or one holding only YAML comments) yields an empty map.
pub fn parse(front: RawFrontMatter<'_>) -> Result<Map<String, Value>, FrontMatterError> {
    if front.text.trim().is_empty() {
        return Ok(Map::new());
    }

    let value = match front.format {
        Format::Yaml => serde_yaml::from_str::<Value>(front.text)?,
        Format::Toml => toml_to_json(toml::Value::Table(toml::from_str(front.text)?)),
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(FrontMatterError::NotMapping),
    }
}

/// Convert a TOML value to JSON. Datetimes become their RFC 3339 text.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
