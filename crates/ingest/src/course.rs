//! Course-page source adapter: fetch the page and flatten the HTML into
//! raw text for the curriculum decomposer.

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use lernwerk_core::{ExtractedContent, PipelineError, SourceDescriptor};

use crate::adapter::{get_ok, SourceAdapter};
use crate::youtube::decode_entities;

pub struct CoursePageAdapter {
    client: reqwest::Client,
}

impl CoursePageAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Strip markup down to readable text: drop script/style/head blocks,
/// turn block-level tags into newlines, strip the rest, decode entities.
pub fn html_to_text(html: &str) -> String {
    let block_content = Regex::new(
        r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<head[^>]*>.*?</head>|<noscript[^>]*>.*?</noscript>",
    )
    .expect("static regex");
    let without_blocks = block_content.replace_all(html, " ");

    let breaks = Regex::new(r"(?i)</?(p|div|br|li|h[1-6]|tr|section|article)[^>]*>")
        .expect("static regex");
    let with_newlines = breaks.replace_all(&without_blocks, "\n");

    let tags = Regex::new(r"<[^>]+>").expect("static regex");
    let stripped = tags.replace_all(&with_newlines, " ");

    let decoded = decode_entities(&stripped);

    // Collapse runs of whitespace but keep line structure.
    let mut lines: Vec<String> = Vec::new();
    for line in decoded.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

/// The `<title>` element, if the page has one.
fn page_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    let title = decode_entities(re.captures(html)?.get(1)?.as_str().trim());
    (!title.is_empty()).then_some(title)
}

#[async_trait]
impl SourceAdapter for CoursePageAdapter {
    async fn extract(
        &self,
        source: &SourceDescriptor,
    ) -> Result<ExtractedContent, PipelineError> {
        let url = match source {
            SourceDescriptor::CourseUrl(u) => u,
            other => {
                return Err(PipelineError::InvalidInput(format!(
                    "course adapter cannot handle a {} source",
                    other.source_type()
                )))
            }
        };
        info!(url, "fetching course page");

        let html = get_ok(&self.client, url)
            .await?
            .text()
            .await
            .map_err(|e| PipelineError::UnavailableSource(e.to_string()))?;

        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(PipelineError::UnsupportedFormat(format!(
                "no readable text on {url}"
            )));
        }

        let title = page_title(&html).unwrap_or_else(|| url.clone());
        Ok(ExtractedContent {
            text,
            title,
            duration_seconds: None,
            origin_url: Some(url.clone()),
        })
    }
}
