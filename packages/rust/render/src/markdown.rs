//! Markdown → HTML rendering.

use async_trait::async_trait;
use tracing::debug;

use contentgraph_shared::{MarkdownConfig, Result};

/// Renders raw markdown to HTML.
#[async_trait]
pub trait MarkdownRenderer: Send + Sync {
    async fn render(&self, raw: &str) -> Result<String>;
}

/// [`MarkdownRenderer`] backed by `comrak`.
#[derive(Debug, Clone, Default)]
pub struct ComrakRenderer {
    config: MarkdownConfig,
}

impl ComrakRenderer {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    fn render_sync(&self, raw: &str) -> String {
        let mut options = comrak::Options::default();
        if self.config.gfm {
            options.extension.table = true;
            options.extension.strikethrough = true;
            options.extension.autolink = true;
            options.extension.tasklist = true;
        }
        options.render.unsafe_ = self.config.unsafe_html;
        options.render.hardbreaks = self.config.hard_breaks;

        comrak::markdown_to_html(raw, &options)
            .trim_end()
            .to_string()
    }
}

#[async_trait]
impl MarkdownRenderer for ComrakRenderer {
    async fn render(&self, raw: &str) -> Result<String> {
        let html = self.render_sync(raw);
        debug!(raw_len = raw.len(), html_len = html.len(), "rendered markdown");
        Ok(html)
    }
}
