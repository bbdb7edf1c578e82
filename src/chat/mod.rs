//! Upstream LLM and TTS client.
//!
//! Thin forwarding layer over an OpenAI-compatible hosted API: one call for
//! chat completions with a fixed persona prepended, one for speech
//! synthesis. No retries, no request timeouts; failures map to [`ChatError`]
//! and surface to the HTTP caller as a JSON `error` field.

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::ChatError;

/// Fixed persona prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "You are the host of an interactive 3D portfolio. \
Answer as its creator: friendly, concise, concrete about projects and experience. \
Keep replies short enough to be spoken aloud.";

/// One chat turn, as sent to and received from the upstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Client over the hosted chat/speech API.
pub struct ChatClient<'a> {
    http: &'a reqwest::Client,
    cfg: &'a ChatConfig,
}

impl<'a> ChatClient<'a> {
    pub fn new(http: &'a reqwest::Client, cfg: &'a ChatConfig) -> Self {
        Self { http, cfg }
    }

    fn api_key(&self) -> Result<String, ChatError> {
        std::env::var(&self.cfg.api_key_env)
            .map_err(|_| ChatError::MissingApiKey(self.cfg.api_key_env.clone()))
    }

    /// Request a completion for the conversation, system prompt prepended.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let key = self.api_key()?;

        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage::new("system", SYSTEM_PROMPT));
        all.extend_from_slice(messages);

        let request = CompletionRequest {
            model: &self.cfg.model,
            messages: &all,
            temperature: self.cfg.temperature,
            max_completion_tokens: self.cfg.max_tokens,
            top_p: 1.0,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.cfg.api_base))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::LlmRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::UpstreamStatus {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::LlmRequest(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "No response from AI".to_string()))
    }

    /// Synthesize speech for `text`; returns the raw audio bytes.
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>, ChatError> {
        let key = self.api_key()?;

        let request = SpeechRequest {
            model: &self.cfg.tts_model,
            voice: voice.unwrap_or(&self.cfg.voice),
            input: text,
            response_format: "wav",
        };

        let response = self
            .http
            .post(format!("{}/audio/speech", self.cfg.api_base))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::TtsSynthesis(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::UpstreamStatus {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::TtsSynthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
