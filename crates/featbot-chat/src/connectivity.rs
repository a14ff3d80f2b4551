//! Operational check that both external services answer.

use tracing::{info, warn};

use featbot_bedrock::service::{ChatRequest, ChatService, RetrievalService};

pub const CHAT_PROBE: &str = "Hello, can you hear me?";
pub const KNOWLEDGE_BASE_PROBE: &str = "Test query";

const PREVIEW_CHARS: usize = 100;

/// Outcome of each probe: a preview of the reply, or the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub chat: Result<String, String>,
    pub knowledge_base: Result<String, String>,
}

impl ConnectionReport {
    pub fn all_ok(&self) -> bool {
        self.chat.is_ok() && self.knowledge_base.is_ok()
    }
}

/// Send one trivial request to each service. The probes are independent:
/// a failure of one does not skip the other.
pub async fn test_connections(
    chat: &dyn ChatService,
    retrieval: Option<&dyn RetrievalService>,
) -> ConnectionReport {
    let chat_result = match chat.invoke(ChatRequest::prompt(CHAT_PROBE)).await {
        Ok(reply) => {
            info!(reply = %preview(&reply.text), "chat connection successful");
            Ok(preview(&reply.text))
        }
        Err(e) => {
            warn!(error = %e, "chat connection failed");
            Err(e.to_string())
        }
    };

    let kb_result = match retrieval {
        None => {
            warn!("knowledge base not configured");
            Err("knowledge base not configured".to_string())
        }
        Some(kb) => match kb.retrieve(KNOWLEDGE_BASE_PROBE.to_string()).await {
            Ok(answer) => {
                info!(
                    answer = %preview(&answer.answer),
                    sources = answer.sources.len(),
                    "knowledge base connection successful"
                );
                Ok(preview(&answer.answer))
            }
            Err(e) => {
                warn!(error = %e, "knowledge base connection failed");
                Err(e.to_string())
            }
        },
    };

    ConnectionReport {
        chat: chat_result,
        knowledge_base: kb_result,
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
