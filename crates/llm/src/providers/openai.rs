use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{chat_messages, post_json};
use crate::provider::{LlmError, LlmProvider, Message};

/// OpenAI chat-completions backend (also covers compatible gateways via
/// `base_url`).
#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
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
            "temperature": temperature,
            "max_tokens": max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!(model = %self.model, "OpenAI chat completion");
        let resp = post_json(&self.client, &url, Some(&self.api_key), &body).await?;

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_model_and_messages() {
        let provider = OpenAiProvider::new(
            "key".into(),
            "gpt-4o-mini".into(),
            "https://api.openai.com".into(),
        );
        let body = provider.build_request_body(&[Message::user("explain heaps")], 0.3, 512);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["content"], "explain heaps");
    }
}
