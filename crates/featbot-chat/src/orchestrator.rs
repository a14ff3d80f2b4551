//! Turns a user message into a reply.
//!
//! For each message the orchestrator optionally consults the knowledge base,
//! grounds the prompt with its answer, asks the chat model (with the rolling
//! conversation context as the system prompt), then records the exchange in
//! memory and in the history file.
//!
//! Knowledge-base failures only cost the grounding. Chat failures abort the
//! call before memory or history are touched. A failed history write rolls
//! memory back, so memory only ever holds exchanges that were persisted.

use std::sync::Arc;

use tracing::{debug, info, warn};

use featbot_bedrock::context::{augment_prompt, conversation_system_prompt};
use featbot_bedrock::service::{ChatRequest, ChatService, RetrievalService};
use featbot_core::models::turn::{SourceDescriptor, TurnRecord};
use featbot_storage::history::HistoryStore;

use crate::error::ChatError;
use crate::memory::ConversationMemory;

/// The outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    /// Citations from the knowledge base, `None` when it was not used or
    /// failed.
    pub sources: Option<Vec<SourceDescriptor>>,
    /// The knowledge base's own answer that grounded the prompt.
    pub kb_answer: Option<String>,
}

pub struct Orchestrator {
    chat: Arc<dyn ChatService>,
    retrieval: Option<Arc<dyn RetrievalService>>,
    history: HistoryStore,
}

impl Orchestrator {
    pub fn new(chat: Arc<dyn ChatService>, history: HistoryStore) -> Self {
        Self {
            chat,
            retrieval: None,
            history,
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalService>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn chat(&self) -> &Arc<dyn ChatService> {
        &self.chat
    }

    pub fn retrieval(&self) -> Option<&Arc<dyn RetrievalService>> {
        self.retrieval.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Answer `user_text`, update `memory`, and persist the exchange.
    pub async fn respond(
        &self,
        user_text: &str,
        use_knowledge_base: bool,
        memory: &mut ConversationMemory,
    ) -> Result<ChatResponse, ChatError> {
        if user_text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let (kb_answer, sources) = if use_knowledge_base {
            self.consult_knowledge_base(user_text).await
        } else {
            (None, None)
        };

        let prompt = augment_prompt(user_text, kb_answer.as_deref());
        let system = conversation_system_prompt(&memory.get_context());
        debug!(
            grounded = kb_answer.is_some(),
            prompt_len = prompt.len(),
            "sending prompt to chat model"
        );

        let reply = self
            .chat
            .invoke(ChatRequest::prompt(prompt).with_system(system))
            .await?;
        let response = reply.text;

        // Validate before mutating anything.
        let record = TurnRecord::new(user_text, response.as_str())?.with_sources(sources.clone());

        let checkpoint = memory.checkpoint();
        memory.add_turn(user_text, &response).await;
        if let Err(e) = self.history.append(self.history.session_id(), &record) {
            memory.restore(checkpoint);
            return Err(e.into());
        }

        info!(
            session_id = self.history.session_id(),
            sources = sources.as_ref().map_or(0, Vec::len),
            "exchange recorded"
        );

        Ok(ChatResponse {
            response,
            sources,
            kb_answer,
        })
    }

    /// Query the knowledge base. Every failure degrades to "no grounding".
    async fn consult_knowledge_base(
        &self,
        user_text: &str,
    ) -> (Option<String>, Option<Vec<SourceDescriptor>>) {
        let Some(retrieval) = &self.retrieval else {
            warn!("knowledge base requested but not configured");
            return (None, None);
        };

        match retrieval.retrieve(user_text.to_string()).await {
            Ok(answer) => {
                let sources = Some(answer.sources).filter(|s| !s.is_empty());
                (Some(answer.answer), sources)
            }
            Err(e) => {
                warn!(error = %e, "knowledge base retrieval failed, answering without it");
                (None, None)
            }
        }
    }
}
