//! Stateless agent chat: keyword routing to a persona prompt, one LLM
//! call, optional suggestion extraction for the coach persona.

use serde::Serialize;
use tracing::info;

use lernwerk_core::PipelineError;
use lernwerk_llm::{LlmProvider, Message};

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 4096;

const STUDY_PROMPT: &str = "\
You are a Study Assistant AI - an expert tutor helping users understand \
their notes and learning materials. Answer questions, explain complex \
concepts in simple terms, create practice questions, and identify gaps in \
understanding. Be concise, helpful, and engaging.";

const INTERVIEWER_PROMPT: &str = "\
You are an Expert Technical Interviewer AI conducting a rigorous mock \
interview. Ask ONE challenging question at a time, critique answers with \
precision (edge cases, complexity flaws, missing depth), score 0-10, then \
ask the next question. Professional, demanding, yet constructive.";

const COACH_PROMPT: &str = "\
You are a Learning Coach AI - a mentor focused on optimizing the user's \
learning journey. Analyze patterns, suggest study strategies, recommend \
next topics, and provide accountability. Encouraging but direct; focus on \
actionable advice.";

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub agent_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Keyword routing when the client doesn't name an agent.
pub fn route_message(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let contains_any =
        |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(&["interview", "mock", "behavioral", "technical check"]) {
        "interviewer"
    } else if contains_any(&["quiz", "test", "practice", "explain", "what is", "how does"]) {
        "study"
    } else if contains_any(&["progress", "suggest", "recommend", "improve", "pattern"]) {
        "coach"
    } else {
        "study"
    }
}

fn agent_prompt(agent_type: &str) -> &'static str {
    match agent_type {
        "interviewer" => INTERVIEWER_PROMPT,
        "coach" => COACH_PROMPT,
        _ => STUDY_PROMPT,
    }
}

/// Pull actionable bullets or numbered items out of a coach response.
pub fn extract_suggestions(response: &str) -> Vec<String> {
    let mut suggestions = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        let is_item = line
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_digit() || c == '-' || c == '•');
        if is_item {
            let clean = line
                .trim_start_matches(|c: char| {
                    c.is_ascii_digit() || matches!(c, '.' | '-' | '•' | ')' | ' ')
                })
                .trim();
            if clean.len() > 10 {
                suggestions.push(clean.to_string());
            }
        }
    }
    suggestions.truncate(5);
    suggestions
}

/// One stateless chat turn.
pub async fn chat(
    provider: &dyn LlmProvider,
    message: &str,
    agent_type: Option<&str>,
) -> Result<ChatReply, PipelineError> {
    let agent_type = agent_type.unwrap_or_else(|| route_message(message));
    info!(agent_type, "agent chat");

    let messages = vec![
        Message::system(agent_prompt(agent_type)),
        Message::user(message),
    ];
    let reply = provider
        .complete(messages, CHAT_TEMPERATURE, CHAT_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::Generation(e.to_string()))?;

    let suggestions = if agent_type == "coach" {
        let extracted = extract_suggestions(&reply);
        (!extracted.is_empty()).then_some(extracted)
    } else {
        None
    };

    Ok(ChatReply {
        message: reply,
        agent_type: agent_type.to_string(),
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_by_keywords() {
        assert_eq!(route_message("Run a mock interview on B-trees"), "interviewer");
        assert_eq!(route_message("Quiz me on sorting"), "study");
        assert_eq!(route_message("Recommend what to study next"), "coach");
        assert_eq!(route_message("hello there"), "study");
    }

    #[test]
    fn suggestion_extraction_keeps_substantial_items() {
        let response = "\
Here is my advice:
1. Review spaced repetition fundamentals daily
- ok
2) Practice one DSA problem every morning
• Build a personal knowledge graph of topics
random prose line";
        let suggestions = extract_suggestions(response);
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions[0].starts_with("Review spaced repetition"));
    }

    #[test]
    fn suggestions_capped_at_five() {
        let response = (1..=8)
            .map(|i| format!("{i}. A perfectly actionable suggestion number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract_suggestions(&response).len(), 5);
    }
}
