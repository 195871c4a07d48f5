//! Conversation state: committed history plus one replaceable pending slot

use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Wire role for the completion endpoint
    pub fn role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }
}

/// Ordered message list with at most one in-progress assistant message.
///
/// Committed messages are immutable; the pending slot is replaced wholesale
/// on every streamed update, then either committed or discarded when the turn
/// settles. Avoids index-based splicing of the message array.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Option<String>,
    streaming: bool,
    /// Uncommitted input the user is still composing.
    pub draft: String,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the conversation with an initial assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            ..Self::default()
        }
    }

    /// Committed messages, excluding the pending slot.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Current in-progress assistant text, if a turn is streaming.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Commit the user message and open an empty pending assistant slot.
    ///
    /// Whitespace-only input is a no-op and returns `None`; otherwise the
    /// trimmed text that was committed is returned.
    pub fn begin_turn(&mut self, user_text: &str) -> Option<String> {
        let trimmed = user_text.trim();
        if trimmed.is_empty() || self.streaming {
            return None;
        }
        self.messages.push(Message::user(trimmed));
        self.pending = Some(String::new());
        self.streaming = true;
        Some(trimmed.to_string())
    }

    /// Replace the pending assistant text with a new accumulated snapshot.
    ///
    /// Replacement rather than append: think-tag stripping is retroactive
    /// over the whole accumulated string.
    pub fn apply_update(&mut self, text: impl Into<String>) {
        if self.streaming {
            self.pending = Some(text.into());
        }
    }

    /// Finalize the pending assistant message on clean end-of-stream.
    pub fn complete_turn(&mut self) {
        if let Some(text) = self.pending.take() {
            self.messages.push(Message::assistant(text));
        }
        self.streaming = false;
    }

    /// Settle a failed turn.
    ///
    /// Partial text that already streamed in is retained as a final message;
    /// a pending slot that never received content is discarded so the failed
    /// turn shows no assistant message at all.
    pub fn fail_turn(&mut self) {
        match self.pending.take() {
            Some(text) if !text.is_empty() => self.messages.push(Message::assistant(text)),
            _ => {}
        }
        self.streaming = false;
    }
}
