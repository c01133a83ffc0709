//! Prompt templates, one per note type, plus full-prompt assembly.
//!
//! The templates frame the output; the surrounding mechanics are identical
//! across strategies.

use lernwerk_core::{ExtractedContent, NoteType};

const SHARED_PHILOSOPHY: &str = "\
**Core Philosophy: Deep Comprehension Note Generation**
You are a Neural Architect: transform the content into neural-level \
understanding that enhances research capability, implementation mastery, \
and creative problem-solving. Strip concepts to first principles, translate \
jargon to fundamental reality, build mental models, and invert (\"when does \
this fail?\").
";

const STANFORD_PROMPT: &str = "\
**Role**: Polymath Scientist & AI Researcher.
**Context**: University AI lecture (research & concepts).
**Goal**: Notes that let the reader derive, critique, and innovate.
Produce markdown with: an executive brief, a jargon translation table, \
first-principles breakdowns per concept with derivations and physical \
intuition, critical analysis (why it works, when it fails, trade-offs), \
and a synthesis section connecting concepts across disciplines.";

const DSA_PROMPT: &str = "\
**Role**: Senior Staff Engineer running interview prep.
**Context**: Data structures & algorithms lecture or problem walkthrough.
**Goal**: Interview-ready mastery. Produce markdown with: pattern \
identification, step-by-step algorithm derivation, complexity analysis \
with justification, edge cases and failure modes, idiomatic reference \
implementations, and a drill section of follow-up questions.";

const PODCAST_PROMPT: &str = "\
**Role**: Wisdom distiller.
**Context**: Long-form podcast conversation.
**Goal**: Extract every transferable insight. Produce markdown with: the \
core theses, mental models and frameworks mentioned, concrete stories and \
the principles behind them, actionable takeaways, and notable quotes with \
context.";

const CHEATSHEET_PROMPT: &str = "\
**Role**: Technical editor compressing for recall.
**Goal**: A one-page dense cheat sheet. Produce markdown with: terse \
definitions, formulas, comparison tables, decision rules, and common \
pitfalls. No prose paragraphs; bullets and tables only.";

const MODULE_PROMPT: &str = "\
**Role**: Course architect doing a deep dive on one module.
**Goal**: Expand the module topic into complete teaching notes. Produce \
markdown with: learning objectives, prerequisite map, each key concept \
built from first principles with worked examples, common misconceptions, \
and exercises with solutions.";

const RESEARCH_PROMPT: &str = "\
**Role**: Research scientist performing a structured paper breakdown.
**Goal**: Notes that let the reader re-derive and extend the work. Produce \
markdown with: problem statement and motivation, core contribution in one \
paragraph, method walkthrough with the math made explicit, experimental \
setup and what the results actually show, limitations and threats to \
validity, and connections to related work.";

/// Template for the note type's synthesis strategy.
pub fn template_for(note_type: NoteType) -> &'static str {
    match note_type {
        NoteType::Stanford => STANFORD_PROMPT,
        NoteType::Dsa => DSA_PROMPT,
        NoteType::Podcast => PODCAST_PROMPT,
        NoteType::Cheatsheet => CHEATSHEET_PROMPT,
        NoteType::CurriculumModule => MODULE_PROMPT,
        NoteType::Research => RESEARCH_PROMPT,
    }
}

/// Assemble the full user prompt: metadata header, content body, closing
/// instructions.
pub fn build_user_prompt(extracted: &ExtractedContent, note_type: NoteType) -> String {
    let duration_line = match extracted.duration_seconds {
        Some(secs) => format!("Duration: {} seconds ({} minutes)\n", secs, secs / 60),
        None => String::new(),
    };
    format!(
        "**Source Metadata:**\nTitle: {title}\n{duration_line}\n\
         **Complete Content:**\n{text}\n\n---\n\n\
         Now generate comprehensive notes following the specified format. \
         Cover every concept mentioned, use rich markdown formatting, and \
         be thorough and granular. Output type: {kind}.",
        title = extracted.title,
        duration_line = duration_line,
        text = extracted.text,
        kind = note_type.as_str(),
    )
}

/// System prompt = shared philosophy + strategy template.
pub fn build_system_prompt(note_type: NoteType) -> String {
    format!("{SHARED_PHILOSOPHY}\n{}", template_for(note_type))
}

/// Instructions for the fast-model curriculum extraction call.
pub const CURRICULUM_PROMPT: &str = "\
You are a curriculum analyst. Given the raw text of a course page, extract \
the ordered list of modules. Output ONLY a JSON array, no other text. Each \
element: {\"module_number\": <1-based int>, \"title\": \"...\", \
\"description\": \"...\", \"key_concepts\": [\"...\"]}. Titles must be \
non-empty; key_concepts may be an empty array. Preserve the course's own \
ordering.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_note_type_has_a_template() {
        for nt in [
            NoteType::Stanford,
            NoteType::Dsa,
            NoteType::Podcast,
            NoteType::Cheatsheet,
            NoteType::CurriculumModule,
            NoteType::Research,
        ] {
            assert!(!template_for(nt).is_empty());
        }
    }

    #[test]
    fn user_prompt_includes_metadata_and_content() {
        let extracted = ExtractedContent {
            text: "the transcript".into(),
            title: "Lecture 1".into(),
            duration_seconds: Some(120),
            origin_url: None,
        };
        let prompt = build_user_prompt(&extracted, NoteType::Dsa);
        assert!(prompt.contains("Lecture 1"));
        assert!(prompt.contains("120 seconds (2 minutes)"));
        assert!(prompt.contains("the transcript"));
    }
}
