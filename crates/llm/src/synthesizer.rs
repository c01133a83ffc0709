//! Synthesis Engine: one call contract over all note-type strategies.

use tracing::{info, warn};

use lernwerk_core::{ExtractedContent, NoteDraft, NoteType, PipelineError};

use crate::prompts::{build_system_prompt, build_user_prompt};
use crate::provider::{LlmProvider, Message};

/// Minimum usable model output, in characters. Anything shorter is treated
/// as a failed generation.
const MIN_OUTPUT_CHARS: usize = 64;

pub struct NoteSynthesizer {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    /// Extracted content shorter than this is rejected before calling the
    /// model.
    min_input_chars: usize,
}

impl NoteSynthesizer {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        temperature: f32,
        max_tokens: u32,
        min_input_chars: usize,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            min_input_chars,
        }
    }

    /// Run the strategy selected by `note_type` over the extracted content.
    ///
    /// Transient provider failures are retried once; shape problems (input
    /// too short, output empty) are not.
    pub async fn synthesize(
        &self,
        extracted: &ExtractedContent,
        note_type: NoteType,
    ) -> Result<NoteDraft, PipelineError> {
        // Module synthesis expands a short topic brief, so the input
        // threshold only applies to transcript-like content.
        if note_type != NoteType::CurriculumModule && extracted.text.len() < self.min_input_chars {
            return Err(PipelineError::Generation(format!(
                "extracted content too short to synthesize ({} chars, need {})",
                extracted.text.len(),
                self.min_input_chars
            )));
        }

        let messages = vec![
            Message::system(build_system_prompt(note_type)),
            Message::user(build_user_prompt(extracted, note_type)),
        ];

        info!(
            note_type = note_type.as_str(),
            input_chars = extracted.text.len(),
            "synthesizing notes"
        );

        let body = match self
            .provider
            .complete(messages.clone(), self.temperature, self.max_tokens)
            .await
        {
            Ok(body) => body,
            Err(e) if e.is_transient() => {
                warn!(error = %e, "transient generation failure, retrying once");
                self.provider
                    .complete(messages, self.temperature, self.max_tokens)
                    .await
                    .map_err(|e| PipelineError::Generation(e.to_string()))?
            }
            Err(e) => return Err(PipelineError::Generation(e.to_string())),
        };

        let body = body.trim().to_string();
        if body.len() < MIN_OUTPUT_CHARS {
            return Err(PipelineError::Generation(format!(
                "model output too short ({} chars)",
                body.len()
            )));
        }

        Ok(NoteDraft {
            title: extracted.title.clone(),
            body,
            tags: default_tags(note_type),
        })
    }
}

fn default_tags(note_type: NoteType) -> Vec<String> {
    match note_type {
        NoteType::Research => vec!["research".into(), "paper".into()],
        NoteType::CurriculumModule => vec!["curriculum".into(), "module".into()],
        other => vec![other.as_str().to_string()],
    }
}
