//! Streaming chat-completion client
//!
//! One `submit_turn` call owns the whole request/response lifecycle for a
//! single user turn: payload construction from history, one HTTP POST,
//! incremental decoding of the streamed body, think-tag stripping, and
//! replacement-style partial updates until end-of-stream or failure.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::ChatConfig;
use crate::conversation::Message;
use crate::error::{ChatError, Result};
use crate::sse::{self, LineBuffer};
use crate::think::strip_think_tags;

const DISABLE_SYSTEM_PROXY_ENV: &str = "CHATFLOW_DISABLE_SYSTEM_PROXY";

// Tests must reach loopback mock servers directly, never through a system
// proxy. Consumers can force the same with the env var.
fn build_http_client() -> Client {
    let disable_proxy =
        std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() || cfg!(test);
    if disable_proxy {
        Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to build reqwest client")
    } else {
        Client::new()
    }
}

/// Lazy, finite sequence of partial-text updates for one turn.
///
/// Each `Ok` item is the full accumulated assistant text so far with
/// completed think spans stripped; it replaces the previously shown text
/// rather than appending to it. An `Err` item is terminal. Dropping the
/// stream before it finishes closes the underlying connection.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming chat client
pub struct StreamingChatClient {
    client: Client,
    api_key: String,
    config: ChatConfig,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
    max_completion_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl StreamingChatClient {
    /// Create a new client with the process-wide bearer credential.
    ///
    /// The credential is never validated locally; a missing or bad key
    /// surfaces as an authorization failure from the remote service.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            config: ChatConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn build_request(&self, history: &[Message], user_text: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system".to_string(),
            content: self.config.system_instruction.clone(),
        });
        for message in history {
            messages.push(WireMessage {
                role: message.sender.role().to_string(),
                content: message.text.clone(),
            });
        }
        messages.push(WireMessage {
            role: "user".to_string(),
            content: user_text.to_string(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_completion_tokens,
            top_p: self.config.top_p,
            stream: true,
        }
    }

    /// Run one user turn against the completion endpoint.
    ///
    /// `history` is the committed conversation so far, excluding the new
    /// user turn; `user_text` must already be trimmed and non-empty (empty
    /// input is a caller-level no-op, see `Conversation::begin_turn`).
    ///
    /// The sequence is finite and not restartable. Per-turn state machine:
    /// request sent, then streaming, then completed or failed; no retries.
    pub fn submit_turn(&self, history: &[Message], user_text: &str) -> TurnStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = self.build_request(history, user_text);

        Box::pin(async_stream::stream! {
            tracing::debug!(
                model = %body.model,
                message_count = body.messages.len(),
                "dispatching chat completion request"
            );

            let response = match client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(ChatError::Http(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                yield Err(ChatError::RequestFailed {
                    status: status.as_u16(),
                    message: extract_error_reason(&text),
                });
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::new();
            let mut full_response = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        // Partial text already emitted stays emitted; only
                        // the turn itself is reported failed.
                        yield Err(ChatError::StreamRead(e.to_string()));
                        return;
                    }
                };

                for line in lines.push(&chunk) {
                    if let Some(snapshot) = apply_line(&line, &mut full_response) {
                        yield Ok(snapshot);
                    }
                }
            }

            // A final frame may arrive without its trailing newline when the
            // remote closes the connection right after it.
            if let Some(tail) = lines.finish()
                && let Some(snapshot) = apply_line(&tail, &mut full_response)
            {
                yield Ok(snapshot);
            }
        })
    }
}

/// Fold one line of the body into the running response.
///
/// Returns the new think-stripped snapshot when the line carried a content
/// fragment. Non-frame lines and contentless control frames produce nothing;
/// a malformed frame is logged and skipped, never fatal.
fn apply_line(line: &str, full_response: &mut String) -> Option<String> {
    let payload = sse::data_payload(line)?;
    match sse::content_fragment(payload) {
        Ok(Some(fragment)) => {
            full_response.push_str(&fragment);
            Some(strip_think_tags(full_response))
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed stream frame");
            None
        }
    }
}

/// Pull a human-readable reason out of an error body.
///
/// Accepts both `{"message": "..."}` and the OpenAI-style
/// `{"error": {"message": "..."}}`; anything else gets the generic reason.
fn extract_error_reason(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "API request failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_orders_system_history_user() {
        let client = StreamingChatClient::new("test-key");
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let request = client.build_request(&history, "how are you?");

        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(request.messages[0].content, "You are a helpful assistant.");
        assert_eq!(request.messages[3].content, "how are you?");
        assert!(request.stream);
    }

    #[test]
    fn request_serializes_fixed_sampling_parameters() {
        let client = StreamingChatClient::new("test-key");
        let request = client.build_request(&[], "ping");
        let json = serde_json::to_value(&request).expect("serializable request");

        assert_eq!(json["model"], "deepseek-r1-distill-llama-70b");
        assert_eq!(json["temperature"], 0.6);
        assert_eq!(json["max_completion_tokens"], 4096);
        assert_eq!(json["top_p"], 0.95);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn error_reason_from_message_field() {
        assert_eq!(extract_error_reason(r#"{"message":"bad key"}"#), "bad key");
    }

    #[test]
    fn error_reason_from_nested_error_object() {
        assert_eq!(
            extract_error_reason(r#"{"error":{"message":"invalid model"}}"#),
            "invalid model"
        );
    }

    #[test]
    fn error_reason_falls_back_to_generic() {
        assert_eq!(extract_error_reason("<html>502</html>"), "API request failed");
        assert_eq!(extract_error_reason(""), "API request failed");
    }

    #[test]
    fn malformed_frame_does_not_disturb_accumulation() {
        let mut full = String::new();
        assert!(apply_line("data: {bad json}", &mut full).is_none());
        let snapshot = apply_line(
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}",
            &mut full,
        );
        assert_eq!(snapshot.as_deref(), Some("ok"));
        assert_eq!(full, "ok");
    }

    #[test]
    fn non_frame_lines_never_alter_text() {
        let mut full = String::from("kept");
        assert!(apply_line("", &mut full).is_none());
        assert!(apply_line(": keep-alive", &mut full).is_none());
        assert!(apply_line("data: [DONE]", &mut full).is_none());
        assert_eq!(full, "kept");
    }

    #[test]
    fn snapshots_strip_think_spans_retroactively() {
        let mut full = String::new();
        let first = apply_line(
            "data: {\"choices\":[{\"delta\":{\"content\":\"<think>ignore\"}}]}",
            &mut full,
        );
        assert_eq!(first.as_deref(), Some("<think>ignore"));
        let second = apply_line(
            "data: {\"choices\":[{\"delta\":{\"content\":\" me</think>visible\"}}]}",
            &mut full,
        );
        assert_eq!(second.as_deref(), Some("visible"));
    }
}
