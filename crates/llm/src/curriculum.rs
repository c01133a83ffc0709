//! Curriculum Decomposer: fast-model JSON extraction of a course page's
//! module structure, degrading to a single whole-page module when no
//! structure can be found.

use serde::Deserialize;
use tracing::{info, warn};

use lernwerk_core::{ExtractedContent, Module, PipelineError};

use crate::prompts::CURRICULUM_PROMPT;
use crate::provider::{LlmProvider, Message};

/// Course pages can be enormous; truncate what we hand the fast model.
const MAX_PAGE_CHARS: usize = 30_000;

pub struct CurriculumDecomposer {
    provider: Box<dyn LlmProvider>,
    max_tokens: u32,
}

/// Loose shape of what the model returns; validated and renumbered before
/// leaving this module.
#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    key_concepts: Vec<String>,
}

impl CurriculumDecomposer {
    pub fn new(provider: Box<dyn LlmProvider>, max_tokens: u32) -> Self {
        Self { provider, max_tokens }
    }

    /// Decompose extracted course-page text into an ordered module list.
    ///
    /// Always yields at least one module: when the model output cannot be
    /// parsed or contains nothing usable, the whole page becomes a single
    /// module rather than failing the job.
    pub async fn decompose(
        &self,
        extracted: &ExtractedContent,
    ) -> Result<Vec<Module>, PipelineError> {
        let mut page = extracted.text.as_str();
        if page.len() > MAX_PAGE_CHARS {
            let mut cut = MAX_PAGE_CHARS;
            while !page.is_char_boundary(cut) {
                cut -= 1;
            }
            page = &page[..cut];
        }

        let messages = vec![
            Message::system(CURRICULUM_PROMPT),
            Message::user(format!("**COURSE CONTENT**:\n{page}")),
        ];

        let modules = match self.provider.complete(messages, 0.2, self.max_tokens).await {
            Ok(output) => parse_modules(&output),
            Err(e) => {
                warn!(error = %e, "curriculum extraction call failed");
                Vec::new()
            }
        };

        if modules.is_empty() {
            info!("no module structure found, degrading to single module");
            return Ok(vec![whole_page_module(extracted)]);
        }

        info!(count = modules.len(), "curriculum decomposed");
        Ok(modules)
    }
}

/// Parse the model's JSON array, tolerating ``` fences, and renumber to a
/// 1-based gap-free sequence. Modules with empty titles are dropped.
fn parse_modules(output: &str) -> Vec<Module> {
    let json = strip_fences(output);
    let raw: Vec<RawModule> = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "curriculum JSON did not parse");
            return Vec::new();
        }
    };

    raw.into_iter()
        .filter(|m| !m.title.trim().is_empty())
        .enumerate()
        .map(|(i, m)| Module {
            module_number: (i + 1) as u32,
            title: m.title.trim().to_string(),
            description: m.description.trim().to_string(),
            key_concepts: m.key_concepts,
        })
        .collect()
}

/// Remove a surrounding ```json / ``` fence if present.
fn strip_fences(s: &str) -> &str {
    let s = s.trim();
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}

/// Fallback: one module covering the whole page.
fn whole_page_module(extracted: &ExtractedContent) -> Module {
    let description: String = extracted.text.chars().take(500).collect();
    Module {
        module_number: 1,
        title: extracted.title.clone(),
        description,
        key_concepts: Vec::new(),
    }
}
