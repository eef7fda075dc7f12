//! Entry pointer: the identifier of the diary entry being previewed.
//!
//! A pointer names a directory under the docs root that holds `entry.md`:
//!
//! ```text
//! <docs>/<pointer>/entry.md
//! ```
//!
//! Producers may also write pointer *expressions* relative to today, e.g.
//! `$NOW`, `$NOW-1` or `$NOW+'-morning'`, which [`expand`] resolves into a
//! literal pointer before it reaches the server.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::Serialize;

use super::PreviewError;

/// File name of the entry inside a pointer directory.
pub const ENTRY_FILE: &str = "entry.md";

/// Directory for entry assets inside a pointer directory.
pub const ASSETS_DIR: &str = "assets";

/// Validated entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Pointer(String);

impl Pointer {
    /// Validate a raw pointer received from a producer.
    ///
    /// The pointer is joined into a filesystem path, so it must be relative
    /// and must not climb out of the docs root.
    pub fn parse(raw: &str) -> Result<Self, PreviewError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PreviewError::InvalidInput("Filename is required".into()));
        }

        let path = Path::new(raw);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(PreviewError::InvalidInput(format!(
                "Filename `{raw}` must stay inside the docs directory"
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory of this entry under `docs_root`.
    pub fn entry_dir(&self, docs_root: &Path) -> PathBuf {
        docs_root.join(&self.0)
    }

    /// Path of the markdown file for this entry under `docs_root`.
    pub fn entry_path(&self, docs_root: &Path) -> PathBuf {
        self.entry_dir(docs_root).join(ENTRY_FILE)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Pointer expressions
// ============================================================================

const DATE_FORMAT: &str = "%Y-%m-%d";

static DAYS_AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$NOW-(\d+)$").unwrap());

static SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\$NOW\+\s*(?:'([^']+)'|"([^"]+)")$"#).unwrap()
});

/// Resolve a pointer expression against `today`.
///
/// | Expression          | Result                       |
/// |---------------------|------------------------------|
/// | `$NOW`              | `2025-03-14`                 |
/// | `$NOW-2`            | `2025-03-12`                 |
/// | `$NOW+'-night'`     | `2025-03-14-night`           |
/// | anything else       | returned unchanged (trimmed) |
pub fn expand(expr: &str, today: NaiveDate) -> String {
    let expr = expr.trim();
    if !expr.starts_with("$NOW") {
        return expr.to_string();
    }

    if expr == "$NOW" {
        return today.format(DATE_FORMAT).to_string();
    }

    if let Some(caps) = DAYS_AGO.captures(expr)
        && let Ok(days) = caps[1].parse::<u64>()
        && let Some(date) = today.checked_sub_days(Days::new(days))
    {
        return date.format(DATE_FORMAT).to_string();
    }

    if let Some(caps) = SUFFIXED.captures(expr) {
        let suffix = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        return format!("{}{suffix}", today.format(DATE_FORMAT));
    }

    expr.to_string()
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
