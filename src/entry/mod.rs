//! Entry resolution: from the registered pointer to a rendered document.
//!
//! Every call re-reads the file from disk; nothing is cached.

pub mod frontmatter;
pub mod markdown;

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::core::{Pointer, PreviewError};
use crate::preview::LivenessSnapshot;
pub use markdown::MarkdownOptions;

/// Parsed diary entry, derived per request.
#[derive(Debug, Clone)]
pub struct EntryDocument {
    /// File contents as read from disk.
    pub raw: String,
    pub front_matter: Map<String, Value>,
    pub title: String,
    pub dateline: String,
    /// Rendered body HTML.
    pub content: String,
}

impl EntryDocument {
    /// Split, parse and render `raw` as the entry named by `pointer`.
    pub fn parse(
        pointer: &Pointer,
        raw: String,
        options: &MarkdownOptions,
    ) -> Result<Self, PreviewError> {
        let malformed = |e: frontmatter::FrontMatterError| PreviewError::MalformedContent(e.to_string());

        let split = frontmatter::split(&raw).map_err(malformed)?;
        let front_matter = match split.front {
            Some(front) => frontmatter::parse(front).map_err(malformed)?,
            None => Map::new(),
        };
        let content = markdown::render(split.body, options);

        let title = title_of(&front_matter).unwrap_or_else(|| format!("Diary @ {pointer}"));

        Ok(Self {
            front_matter,
            title,
            dateline: pointer.to_string(),
            content,
            raw,
        })
    }

    /// Response body: fixed fields first, then front matter keys that do not
    /// collide with them.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("data".into(), Value::String(self.raw.clone()));
        body.insert("title".into(), Value::String(self.title.clone()));
        body.insert("dateline".into(), Value::String(self.dateline.clone()));
        body.insert("content".into(), Value::String(self.content.clone()));

        for (key, value) in &self.front_matter {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(body)
    }
}

/// Title from front matter: non-empty text, or a stringified scalar.
fn title_of(front_matter: &Map<String, Value>) -> Option<String> {
    match front_matter.get("title")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads entries from the docs root.
pub struct EntryResolver {
    docs_root: PathBuf,
    markdown: MarkdownOptions,
}

impl EntryResolver {
    pub fn new(docs_root: PathBuf) -> Self {
        Self {
            docs_root,
            markdown: MarkdownOptions::all(),
        }
    }

    /// Resolve the current entry given a consistent liveness snapshot.
    pub fn resolve(&self, liveness: &LivenessSnapshot) -> Result<EntryDocument, PreviewError> {
        let pointer = match &liveness.pointer {
            Some(pointer) if liveness.active => pointer,
            _ => return Err(PreviewError::ServiceUnavailable),
        };
        self.load(pointer)
    }

    /// Read and parse the entry for `pointer`, ignoring liveness.
    pub fn load(&self, pointer: &Pointer) -> Result<EntryDocument, PreviewError> {
        let path = pointer.entry_path(&self.docs_root);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            crate::debug!("serve"; "failed to read {}: {}", path.display(), e);
            PreviewError::NotFound(path.clone())
        })?;
        EntryDocument::parse(pointer, raw, &self.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ENTRY_FILE;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn pointer(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    fn active(p: &str) -> LivenessSnapshot {
        LivenessSnapshot {
            pointer: Some(pointer(p)),
            active: true,
        }
    }

    fn write_entry(root: &Path, name: &str, content: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ENTRY_FILE), content).unwrap();
    }

    #[test]
    fn test_title_and_bold_body() {
        let doc = EntryDocument::parse(
            &pointer("2024-01-01"),
            "---\ntitle: \"X\"\n---\n**bold**".into(),
            &MarkdownOptions::all(),
        )
        .unwrap();
        assert_eq!(doc.title, "X");
        assert!(doc.content.contains("<strong>bold</strong>"));
        assert_eq!(doc.dateline, "2024-01-01");
    }

    #[test]
    fn test_default_title() {
        let doc = EntryDocument::parse(&pointer("2024-01-01"), "plain".into(), &MarkdownOptions::all())
            .unwrap();
        assert_eq!(doc.title, "Diary @ 2024-01-01");
        assert!(doc.front_matter.is_empty());
    }

    #[test]
    fn test_blank_or_structured_title_falls_back() {
        for raw in ["---\ntitle: \"  \"\n---\n", "---\ntitle: [a]\n---\n", "---\ntitle:\n---\n"] {
            let doc = EntryDocument::parse(&pointer("p"), raw.into(), &MarkdownOptions::all()).unwrap();
            assert_eq!(doc.title, "Diary @ p", "for {raw:?}");
        }
    }

    #[test]
    fn test_numeric_title_is_stringified() {
        let doc = EntryDocument::parse(&pointer("p"), "---\ntitle: 42\n---\n".into(), &MarkdownOptions::all())
            .unwrap();
        assert_eq!(doc.title, "42");
    }

    #[test]
    fn test_fixed_fields_win_over_front_matter() {
        let raw = "---\ntitle: Mine\ndateline: fake\ncontent: fake\ndata: fake\nmood: calm\n---\nbody";
        let doc = EntryDocument::parse(&pointer("2024-05-05"), raw.into(), &MarkdownOptions::all())
            .unwrap();
        let json = doc.to_json();

        assert_eq!(json["title"], "Mine");
        assert_eq!(json["dateline"], "2024-05-05");
        assert_eq!(json["content"], "<p>body</p>\n");
        assert_eq!(json["data"], raw);
        assert_eq!(json["mood"], "calm");
    }

    #[test]
    fn test_json_field_order() {
        let doc = EntryDocument::parse(&pointer("p"), "---\nzeta: 1\n---\n".into(), &MarkdownOptions::all())
            .unwrap();
        let json = doc.to_json();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["data", "title", "dateline", "content", "zeta"]);
    }

    #[test]
    fn test_malformed_front_matter() {
        let err = EntryDocument::parse(&pointer("p"), "---\ntitle: x\n".into(), &MarkdownOptions::all())
            .unwrap_err();
        assert!(matches!(err, PreviewError::MalformedContent(_)));
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_resolve_requires_active_producer() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "a", "hi");
        let resolver = EntryResolver::new(temp.path().to_path_buf());

        let never = LivenessSnapshot {
            pointer: None,
            active: false,
        };
        assert!(matches!(resolver.resolve(&never), Err(PreviewError::ServiceUnavailable)));

        let stale = LivenessSnapshot {
            pointer: Some(pointer("a")),
            active: false,
        };
        assert!(matches!(resolver.resolve(&stale), Err(PreviewError::ServiceUnavailable)));
    }

    #[test]
    fn test_resolve_missing_file() {
        let temp = TempDir::new().unwrap();
        let resolver = EntryResolver::new(temp.path().to_path_buf());
        let err = resolver.resolve(&active("nope")).unwrap_err();
        assert!(matches!(err, PreviewError::NotFound(_)));
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_resolve_rereads_every_call() {
        let temp = TempDir::new().unwrap();
        write_entry(temp.path(), "a", "first");
        let resolver = EntryResolver::new(temp.path().to_path_buf());

        assert!(resolver.resolve(&active("a")).unwrap().content.contains("first"));
        write_entry(temp.path(), "a", "second");
        assert!(resolver.resolve(&active("a")).unwrap().content.contains("second"));
    }
}
