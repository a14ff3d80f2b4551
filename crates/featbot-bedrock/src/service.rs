//! Capability traits for the external services.
//!
//! The orchestrator and conversation memory only talk to these traits, so
//! the Bedrock clients can be swapped for in-memory fakes in tests.
//! Methods return boxed futures for dyn compatibility.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use featbot_core::models::token_count::TokenCount;
use featbot_core::models::turn::SourceDescriptor;

use crate::error::BedrockError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One call to the chat-completion service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A single user turn with no system prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            system: None,
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: text.into(),
            }],
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// The assistant's reply and, when the service reports it, token usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub usage: Option<TokenCount>,
}

/// A grounded answer from the knowledge base and the sources it cites, in
/// the order the service returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBaseAnswer {
    pub answer: String,
    pub sources: Vec<SourceDescriptor>,
}

/// Chat-completion capability.
pub trait ChatService: Send + Sync {
    fn invoke(&self, request: ChatRequest) -> BoxFuture<'_, Result<ChatReply, BedrockError>>;
}

/// Knowledge-base retrieval capability.
pub trait RetrievalService: Send + Sync {
    fn retrieve(&self, query: String) -> BoxFuture<'_, Result<KnowledgeBaseAnswer, BedrockError>>;
}
