use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{chat_messages, post_json};
use crate::provider::{LlmError, LlmProvider, Message};

/// Local Ollama backend, useful for offline development.
#[derive(Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
        }
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": chat_messages(messages),
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!(model = %self.model, "Ollama chat completion");
        let resp = post_json(&self.client, &url, None, &body).await?;

        resp["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_disables_streaming_and_caps_prediction() {
        let provider = OllamaProvider::new("http://localhost:11434".into(), "llama3".into());
        let body = provider.build_request_body(&[Message::user("hi")], 0.2, 256);
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 256);
    }
}
