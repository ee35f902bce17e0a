use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Completion, CompletionClient, CompletionResult};
use crate::core::error::ProviderError;

/// Client for OpenAI-compatible `/chat/completions` endpoints such as Groq.
#[derive(Debug)]
pub struct ChatCompletionsClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl ChatCompletionsClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

impl Completion {
    /// A missing message content counts as empty text.
    pub fn from_chat(response: ChatResponse) -> CompletionResult {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::from_message("Chat completion returned no choices"))?;
        Ok(Completion::new(choice.message.content.unwrap_or_default()))
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, model: &str, prompt: &str) -> CompletionResult {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await?;
            return Err(ProviderError::new(
                Some(status.as_u16()),
                format!("Chat completion API error ({}): {}", status, error_text),
            ));
        }

        let result: ChatResponse = resp.json().await?;
        Completion::from_chat(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_parsing_success() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "The fog lifted at dawn."
                },
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 9,
                "completion_tokens": 12,
                "total_tokens": 21
            }
        }"#;

        let result: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            Completion::from_chat(result).unwrap().text,
            "The fog lifted at dawn."
        );
    }

    #[test]
    fn test_chat_response_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let result: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(Completion::from_chat(result).unwrap().text, "");
    }

    #[test]
    fn test_chat_response_no_choices() {
        let result: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(Completion::from_chat(result).is_err());
    }
}
