//! Turn a composed document into the markup a reader sees.
//!
//! The document string is treated as trusted markup: it is emitted as-is apart
//! from code fragments, which are swapped for syntax highlighted versions.
//! Nothing here sanitizes. Escaping user text is the block serializer's job,
//! and free text written directly by an author passes through untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

// Matches only the exact shape the serializer emits. Highlighted output uses a
// different opening tag, so a second pass leaves it alone.
static CODE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-([A-Za-z0-9_+#-]+)">(.*?)</code></pre>"#)
        .expect("code fragment pattern is valid")
});

const INTERACTIVE_EDITOR_OPEN: &str = "<div class=\"code-editor\">";

/// A code fragment found while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeFragment {
    /// Position among all code fragments in the document.
    pub index: usize,
    pub language: String,
    /// Decoded source, i.e. what a copy button puts on the clipboard.
    pub source: String,
    /// Whether the fragment sits inside a runnable block.
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub html: String,
    pub code: Vec<CodeFragment>,
}

impl Rendered {
    pub fn runnable(&self) -> impl Iterator<Item = &CodeFragment> {
        self.code.iter().filter(|c| c.interactive)
    }
}

/// Syntax highlighter bound to one color theme.
#[derive(Debug, Clone)]
pub struct Highlighter {
    theme: Theme,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl Highlighter {
    /// Unknown theme names fall back to [`DEFAULT_THEME`].
    pub fn new(theme_name: &str) -> Self {
        let theme = THEME_SET
            .themes
            .get(theme_name)
            .or_else(|| THEME_SET.themes.get(DEFAULT_THEME))
            .cloned()
            .unwrap_or_default();
        Self { theme }
    }

    pub fn theme_names() -> Vec<&'static str> {
        THEME_SET.themes.keys().map(String::as_str).collect()
    }

    fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
        SYNTAX_SET.find_syntax_by_token(language).or_else(|| {
            // Fallback mappings for editor languages syntect names differently
            match language {
                "csharp" => SYNTAX_SET.find_syntax_by_token("cs"),
                "bash" => SYNTAX_SET.find_syntax_by_token("sh"),
                _ => None,
            }
        })
    }

    /// Highlight `source` into a run of styled spans (no wrapper element).
    ///
    /// Unknown languages come back escaped but unstyled.
    pub fn highlight(&self, language: &str, source: &str) -> String {
        let Some(syntax) = Self::find_syntax(language) else {
            return html_escape::encode_text(source).into_owned();
        };

        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut out = String::with_capacity(source.len() * 2);
        for line in LinesWithEndings::from(source) {
            let styled = lines
                .highlight_line(line, &SYNTAX_SET)
                .and_then(|regions| styled_line_to_highlighted_html(&regions, IncludeBackground::No));
            match styled {
                Ok(html) => out.push_str(&html),
                Err(_) => return html_escape::encode_text(source).into_owned(),
            }
        }
        out
    }

    fn background(&self) -> Option<String> {
        self.theme
            .settings
            .background
            .map(|c| format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
    }
}

/// Render a document, highlighting every code fragment in it.
///
/// Rendering is idempotent: feeding the output back in yields the same markup.
pub fn render(highlighter: &Highlighter, doc: &str) -> Rendered {
    let mut code = Vec::new();
    let style = highlighter
        .background()
        .map(|bg| format!(" style=\"background-color:{};\"", bg))
        .unwrap_or_default();

    let html = CODE_FRAGMENT.replace_all(doc, |caps: &Captures| {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or_default();
        let language = &caps[1];
        let source = html_escape::decode_html_entities(&caps[2]).into_owned();
        let interactive = doc[..whole].trim_end().ends_with(INTERACTIVE_EDITOR_OPEN);

        let highlighted = highlighter.highlight(language, &source);
        code.push(CodeFragment {
            index: code.len(),
            language: language.to_string(),
            source,
            interactive,
        });

        format!(
            "<pre class=\"highlighted\"{}><code class=\"language-{}\" data-highlighted=\"true\">{}</code></pre>",
            style, language, highlighted
        )
    });

    Rendered {
        html: html.into_owned(),
        code,
    }
}
