//! Embedded browser client.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Preview page, client script and stylesheet
//!
//! ```ignore
//! use embed::serve::{INDEX_HTML, IndexVars, PREVIEW_JS, PreviewJsVars};
//!
//! let html = INDEX_HTML.render(&IndexVars { page_title: "Diary Preview" });
//! let js = PREVIEW_JS.render(&PreviewJsVars { reconnect_ms: 2000 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// Variables for index.html.
    pub struct IndexVars<'a> {
        pub page_title: &'a str,
    }

    impl TemplateVars for IndexVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__PAGE_TITLE__", &escape(self.page_title))
        }
    }

    /// Preview page shell.
    pub const INDEX_HTML: Template<IndexVars<'static>> =
        Template::new(include_str!("serve/index.html"));

    /// Variables for preview.js.
    pub struct PreviewJsVars {
        /// Delay before reopening a dropped event stream.
        pub reconnect_ms: u64,
    }

    impl TemplateVars for PreviewJsVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__RECONNECT_MS__", &self.reconnect_ms.to_string())
        }
    }

    /// Client script: fetches the entry and listens on `/events`.
    pub const PREVIEW_JS: Template<PreviewJsVars> =
        Template::new(include_str!("serve/preview.js"));

    /// Stylesheet, served as-is.
    pub const PREVIEW_CSS: &str = include_str!("serve/preview.css");

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_index_references_client_assets() {
            let html = INDEX_HTML.render(&IndexVars {
                page_title: "Diary <Preview>",
            });
            assert!(html.contains("<title>Diary &lt;Preview&gt;</title>"));
            assert!(html.contains("/scripts/preview.js"));
            assert!(html.contains("/styles/preview.css"));
            assert!(!html.contains("__PAGE_TITLE__"));
        }

        #[test]
        fn test_script_is_rendered() {
            let js = PREVIEW_JS.render(&PreviewJsVars { reconnect_ms: 1500 });
            assert!(js.contains("const RECONNECT_MS = 1500;"));
            assert!(js.contains("new EventSource(\"/events\")"));
            assert!(js.contains("res.status"));
        }
    }
}
