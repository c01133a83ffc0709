pub mod gemini;
pub mod ollama;
pub mod openai;

use lernwerk_core::config::LlmConfig;
use serde_json::json;

use crate::provider::{LlmError, LlmProvider, Message, Role};

/// Create the appropriate LLM provider based on config.
///
/// `model` is passed explicitly so callers can build a second instance on
/// the fast model for curriculum extraction.
pub fn create_provider(config: &LlmConfig, model: &str) -> Result<Box<dyn LlmProvider>, LlmError> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GENAI_API_KEY not set".into()))?;
            Ok(Box::new(gemini::GeminiProvider::new(
                api_key.clone(),
                model.to_string(),
            )))
        }
        "openai" => {
            let api_key = config
                .api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.clone(),
                model.to_string(),
                base_url_or(config, "https://api.openai.com"),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            base_url_or(config, "http://localhost:11434"),
            model.to_string(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider '{other}' (expected gemini, openai, or ollama)"
        ))),
    }
}

fn base_url_or(config: &LlmConfig, default: &str) -> String {
    if config.base_url.is_empty() {
        default.to_string()
    } else {
        config.base_url.clone()
    }
}

/// Wire shape shared by the OpenAI and Ollama chat APIs.
pub(crate) fn chat_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content,
            })
        })
        .collect()
}

/// POST a JSON body, fail on non-200, decode the JSON reply.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
) -> Result<serde_json::Value, LlmError> {
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError { status, body });
    }
    Ok(response.json().await?)
}
