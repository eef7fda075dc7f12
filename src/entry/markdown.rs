//! Markdown body rendering using pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled
    pub fn all() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
        }
    }

    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Render markdown to an HTML fragment.
pub fn render(markdown: &str, options: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(markdown, options.to_pulldown_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(
            render("**bold** text", &MarkdownOptions::all()),
            "<p><strong>bold</strong> text</p>\n"
        );
    }

    #[test]
    fn test_heading_and_link() {
        let html = render("# Day\n\n[home](/)", &MarkdownOptions::default());
        assert!(html.contains("<h1>Day</h1>"));
        assert!(html.contains(r#"<a href="/">home</a>"#));
    }

    #[test]
    fn test_extensions_toggle() {
        let md = "~~gone~~";
        assert!(render(md, &MarkdownOptions::all()).contains("<del>gone</del>"));
        assert!(!render(md, &MarkdownOptions::default()).contains("<del>"));
    }

    #[test]
    fn test_table_and_tasks() {
        let html = render(
            "| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n",
            &MarkdownOptions::all(),
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_inline_html_passes_through() {
        let html = render("<mark>hi</mark>", &MarkdownOptions::all());
        assert!(html.contains("<mark>hi</mark>"));
    }
}
