//! Chatflow core - streaming chat-completion client
//!
//! This crate provides:
//! - Request construction from conversation history ([system, ...history, user])
//! - Incremental SSE decoding of `stream: true` completion responses
//! - Retroactive `<think>…</think>` reasoning-span stripping
//! - Conversation state with a single replaceable in-progress assistant slot

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod sse;
pub mod think;

// Re-export commonly used types
pub use client::{StreamingChatClient, TurnStream};
pub use config::ChatConfig;
pub use conversation::{Conversation, Message, Sender};
pub use error::{ChatError, Result};
pub use think::{strip_think_tags, visible_prefix};
