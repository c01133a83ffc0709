//! Research-paper source adapter: fetch or accept PDF bytes, extract the
//! text, and clean common paper artifacts.

use async_trait::async_trait;
use tracing::info;

use lernwerk_core::{ExtractedContent, PipelineError, SourceDescriptor};

use crate::adapter::{get_ok, SourceAdapter};

pub struct PaperAdapter {
    client: reqwest::Client,
}

impl PaperAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Cheap sniff before handing bytes to the extractor.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Extract text from PDF bytes, failing with `UnsupportedFormat` when the
/// document yields nothing usable.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PipelineError> {
    if !looks_like_pdf(bytes) {
        return Err(PipelineError::UnsupportedFormat(
            "content does not look like a PDF document".into(),
        ));
    }
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PipelineError::UnsupportedFormat(format!("PDF extraction failed: {e}")))?;
    let cleaned = clean_paper_text(&text);
    if cleaned.trim().is_empty() {
        return Err(PipelineError::UnsupportedFormat(
            "PDF contained no extractable text".into(),
        ));
    }
    Ok(cleaned)
}

/// Drop lines that are just page numbers.
pub fn clean_paper_text(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().chars().all(|c| c.is_ascii_digit()) || line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Derive a title from the URL's last path segment or the upload filename.
pub fn title_from_name(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    let last = last.split('?').next().unwrap_or(last);
    last.strip_suffix(".pdf").unwrap_or(last).to_string()
}

#[async_trait]
impl SourceAdapter for PaperAdapter {
    async fn extract(
        &self,
        source: &SourceDescriptor,
    ) -> Result<ExtractedContent, PipelineError> {
        let (bytes, title, origin_url) = match source {
            SourceDescriptor::PaperUrl(url) => {
                info!(url, "fetching paper");
                let bytes = get_ok(&self.client, url)
                    .await?
                    .bytes()
                    .await
                    .map_err(|e| PipelineError::UnavailableSource(e.to_string()))?
                    .to_vec();
                (bytes, title_from_name(url), Some(url.clone()))
            }
            SourceDescriptor::PaperUpload { filename, bytes } => {
                info!(filename, size = bytes.len(), "extracting uploaded paper");
                (bytes.clone(), title_from_name(filename), None)
            }
            other => {
                return Err(PipelineError::InvalidInput(format!(
                    "paper adapter cannot handle a {} source",
                    other.source_type()
                )))
            }
        };

        let text = extract_pdf_text(&bytes)?;
        Ok(ExtractedContent {
            text,
            title,
            duration_seconds: None,
            origin_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_pdf_magic() {
        assert!(looks_like_pdf(b"%PDF-1.7 rest"));
        assert!(!looks_like_pdf(b"<html>"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn non_pdf_bytes_are_unsupported() {
        assert!(matches!(
            extract_pdf_text(b"plain text, not a pdf"),
            Err(PipelineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn cleaner_drops_page_number_lines() {
        let text = "Abstract\n3\nWe present a method.\n42\nConclusion";
        assert_eq!(
            clean_paper_text(text),
            "Abstract\nWe present a method.\nConclusion"
        );
    }

    #[test]
    fn cleaner_keeps_blank_lines() {
        assert_eq!(clean_paper_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn titles_from_urls_and_filenames() {
        assert_eq!(title_from_name("https://arxiv.org/pdf/1706.03762.pdf"), "1706.03762");
        assert_eq!(title_from_name("attention.pdf"), "attention");
        assert_eq!(title_from_name("https://host/p.pdf?dl=1"), "p");
    }
}
