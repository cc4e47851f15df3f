use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

pub const PAGE_TEMPLATE: &str = "page.html";

const DEFAULT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{{ title }}</title>
    {%- for sheet in stylesheets %}
    <link rel="stylesheet" href="{{ sheet }}">
    {%- endfor %}
</head>
<body>
<main class="preview-content">
{{ content | safe }}
</main>
<script>
window.copyCode = function (button) {
    const block = button.closest('.blog-code-block');
    const code = block.querySelector('code').textContent;
    navigator.clipboard.writeText(code).then(() => {
        const original = button.textContent;
        button.textContent = 'Copied!';
        setTimeout(() => { button.textContent = original; }, 2000);
    });
};
{%- if run_endpoint %}
window.runCode = async function (button) {
    const blocks = Array.from(document.querySelectorAll('.blog-code-interactive'));
    const block = button.closest('.blog-code-interactive');
    const output = block.querySelector('.output-content');
    const label = button.textContent;
    button.disabled = true;
    button.textContent = 'Running...';
    output.textContent = 'Executing code...';
    try {
        const response = await fetch('{{ run_endpoint | safe }}', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ index: blocks.indexOf(block) })
        });
        const text = await response.text();
        let result;
        try { result = JSON.parse(text); } catch (_) { result = { status: 'failed', output: text }; }
        output.textContent = result.output;
        output.style.color = result.status === 'failed' ? '#ff6b6b' : '';
    } catch (error) {
        output.textContent = 'Error:\n' + error.message;
        output.style.color = '#ff6b6b';
    } finally {
        button.disabled = false;
        button.textContent = label;
    }
};
{%- endif %}
</script>
</body>
</html>
"#;

#[derive(Debug)]
pub enum TemplateError {
    TeraError(tera::Error),
    IoError(std::io::Error),
}

impl From<tera::Error> for TemplateError {
    fn from(err: tera::Error) -> Self {
        TemplateError::TeraError(err)
    }
}

impl From<std::io::Error> for TemplateError {
    fn from(err: std::io::Error) -> Self {
        TemplateError::IoError(err)
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::TeraError(e) => write!(f, "Template error: {}", e),
            TemplateError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Values available to the page template.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub title: &'a str,
    /// Rendered document markup, inserted unescaped.
    pub content: &'a str,
    /// Where interactive blocks post run requests. No run script is emitted when unset.
    pub run_endpoint: Option<&'a str>,
    pub stylesheets: Vec<String>,
}

/// Wraps rendered content in a complete HTML page.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Use the built-in page template.
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, DEFAULT_PAGE)?;
        Ok(Self { tera })
    }

    /// Load templates from a glob such as `theme/**/*.html`.
    ///
    /// If the glob has no `page.html`, the built-in one is used.
    pub fn from_glob(theme_glob: &str) -> Result<Self, TemplateError> {
        let mut tera = Tera::new(theme_glob)?;
        if !tera.get_template_names().any(|name| name == PAGE_TEMPLATE) {
            tera.add_raw_template(PAGE_TEMPLATE, DEFAULT_PAGE)?;
        }
        Ok(Self { tera })
    }

    pub fn render(&self, page: &PageContext<'_>) -> Result<String, TemplateError> {
        let context = Context::from_serialize(page)?;
        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }

    /// Render a page and write it directly to a file
    pub fn render_to_file(
        &self,
        page: &PageContext<'_>,
        output_path: &Path,
    ) -> Result<(), TemplateError> {
        let rendered = self.render(page)?;

        // Ensure parent directory exists
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(output_path, rendered)?;
        Ok(())
    }
}
