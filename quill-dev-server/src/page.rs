use std::sync::Arc;

use anyhow::Result;
use quill_core::{Highlighter, PageContext, PageRenderer, render};
use quill_exec::{CodeRunner, Executor};

/// Path interactive blocks post run requests to.
pub const RUN_ENDPOINT: &str = "/__run";

/// A rendered document plus one runner per interactive block, in page order.
pub struct Preview {
    pub page: String,
    runners: Vec<Arc<CodeRunner>>,
}

impl Preview {
    pub fn runner(&self, index: usize) -> Option<Arc<CodeRunner>> {
        self.runners.get(index).cloned()
    }

    pub fn runner_count(&self) -> usize {
        self.runners.len()
    }
}

/// Turns document markup into a full preview page.
pub struct PagePipeline {
    highlighter: Highlighter,
    renderer: PageRenderer,
    executor: Executor,
    title: String,
    stylesheets: Vec<String>,
}

impl PagePipeline {
    pub fn new(
        syntax_theme: &str,
        title: impl Into<String>,
        stylesheets: Vec<String>,
        executor: Executor,
    ) -> Result<Self> {
        Ok(Self {
            highlighter: Highlighter::new(syntax_theme),
            renderer: PageRenderer::new()?,
            executor,
            title: title.into(),
            stylesheets,
        })
    }

    /// Render `markup`. Runners whose block is unchanged since `previous`
    /// are carried over so an in-flight run keeps its guard.
    pub fn render(&self, markup: &str, previous: Option<&Preview>) -> Result<Preview> {
        let rendered = render(&self.highlighter, markup);

        let runners = rendered
            .runnable()
            .enumerate()
            .map(|(i, fragment)| {
                previous
                    .and_then(|p| p.runners.get(i))
                    .filter(|r| r.language() == fragment.language && r.source() == fragment.source)
                    .cloned()
                    .unwrap_or_else(|| {
                        Arc::new(CodeRunner::new(
                            self.executor.clone(),
                            fragment.language.as_str(),
                            fragment.source.as_str(),
                        ))
                    })
            })
            .collect();

        let page = self.renderer.render(&PageContext {
            title: &self.title,
            content: &rendered.html,
            run_endpoint: Some(RUN_ENDPOINT),
            stylesheets: self.stylesheets.clone(),
        })?;

        Ok(Preview {
            page: inject_livereload_script(&page),
            runners,
        })
    }
}

/// Inject live reload script into HTML content
pub fn inject_livereload_script(html: &str) -> String {
    let script = r#"
<script>
(function() {
    const socket = new WebSocket('ws://' + location.host + '/__livereload');
    socket.onmessage = function(event) {
        if (event.data === 'reload') {
            location.reload();
        }
    };
    socket.onclose = function() {
        console.log('Live reload disconnected');
    };
})();
</script>
"#;

    // Before the closing body tag, or at the end if there is none
    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script.len());
        result.push_str(&html[..pos]);
        result.push_str(script);
        result.push_str(&html[pos..]);
        result
    } else {
        format!("{}{}", html, script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ContentBlock;
    use quill_core::document::append;
    use quill_exec::{LocalStrategy, RemoteStrategy};
    use std::time::Duration;

    fn pipeline() -> PagePipeline {
        let executor = Executor::new(
            Arc::new(RemoteStrategy::new("http://127.0.0.1:9")),
            Arc::new(LocalStrategy::new("/no/such/node", Duration::from_millis(100))),
        );
        PagePipeline::new("base16-ocean.dark", "Draft", vec![], executor).unwrap()
    }

    fn markup(python: &str) -> String {
        let doc = append(
            "<p>Intro</p>",
            &ContentBlock::code("rust", "fn main() {}", false).unwrap().serialize(),
        )
        .unwrap();
        append(
            &doc,
            &ContentBlock::code("python", python, true).unwrap().serialize(),
        )
        .unwrap()
    }

    #[test]
    fn test_script_injected_before_body() {
        let html = inject_livereload_script("<html><body><p>x</p></body></html>");
        let script = html.find("/__livereload").unwrap();
        assert!(script < html.rfind("</body>").unwrap());

        let bare = inject_livereload_script("<p>x</p>");
        assert!(bare.starts_with("<p>x</p>"));
        assert!(bare.contains("location.reload()"));
    }

    #[test]
    fn test_only_interactive_blocks_get_runners() {
        let preview = pipeline().render(&markup("print(1)"), None).unwrap();

        assert_eq!(preview.runner_count(), 1);
        let runner = preview.runner(0).unwrap();
        assert_eq!(runner.language(), "python");
        assert_eq!(runner.source(), "print(1)");
        assert!(preview.runner(1).is_none());

        assert!(preview.page.contains("window.runCode"));
        assert!(preview.page.contains("/__livereload"));
    }

    #[test]
    fn test_unchanged_runners_survive_rerender() {
        let pipeline = pipeline();
        let first = pipeline.render(&markup("print(1)"), None).unwrap();
        let same = pipeline.render(&markup("print(1)"), Some(&first)).unwrap();
        let edited = pipeline.render(&markup("print(2)"), Some(&first)).unwrap();

        let original = first.runner(0).unwrap();
        assert!(Arc::ptr_eq(&original, &same.runner(0).unwrap()));
        assert!(!Arc::ptr_eq(&original, &edited.runner(0).unwrap()));
    }
}
