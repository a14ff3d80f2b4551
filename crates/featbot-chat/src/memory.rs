//! Summarizing conversation memory.
//!
//! Keeps the most recent turns verbatim and folds older ones into a running
//! summary once the verbatim buffer grows past a token budget. The summary
//! is written by the chat service itself; there is no local summarizer.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use featbot_bedrock::error::BedrockError;
use featbot_bedrock::service::{ChatRequest, ChatService};
use featbot_bedrock::tokens;
use featbot_core::models::turn::TurnRecord;

/// Default budget for the verbatim part of the context, in estimated tokens.
pub const DEFAULT_TOKEN_LIMIT: usize = 300;

const SUMMARY_PROMPT: &str = "\
Progressively summarize the lines of conversation provided, adding onto the \
previous summary and returning a new summary. Reply with the new summary only.";

/// One exchange held verbatim in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTurn {
    pub user: String,
    pub assistant: String,
}

impl MemoryTurn {
    fn render(&self) -> String {
        format!("Human: {}\nAI: {}", self.user, self.assistant)
    }
}

/// Saved memory state, see [`ConversationMemory::checkpoint`].
#[derive(Debug, Clone)]
pub struct MemoryCheckpoint {
    summary: String,
    turns: VecDeque<MemoryTurn>,
}

/// Rolling conversation context for one chat session.
pub struct ConversationMemory {
    summarizer: Arc<dyn ChatService>,
    max_token_limit: usize,
    summary: String,
    turns: VecDeque<MemoryTurn>,
}

impl fmt::Debug for ConversationMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationMemory")
            .field("max_token_limit", &self.max_token_limit)
            .field("summary", &self.summary)
            .field("turns", &self.turns)
            .finish_non_exhaustive()
    }
}

impl ConversationMemory {
    pub fn new(summarizer: Arc<dyn ChatService>) -> Self {
        Self::with_token_limit(summarizer, DEFAULT_TOKEN_LIMIT)
    }

    pub fn with_token_limit(summarizer: Arc<dyn ChatService>, max_token_limit: usize) -> Self {
        Self {
            summarizer,
            max_token_limit,
            summary: String::new(),
            turns: VecDeque::new(),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn turns(&self) -> &VecDeque<MemoryTurn> {
        &self.turns
    }

    pub fn max_token_limit(&self) -> usize {
        self.max_token_limit
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.turns.is_empty()
    }

    /// Estimated tokens held verbatim (the summary is not counted).
    pub fn estimated_tokens(&self) -> usize {
        tokens::estimate(&self.buffer_text())
    }

    /// Record a completed exchange, summarizing older turns if the buffer
    /// is over budget.
    pub async fn add_turn(&mut self, user_text: &str, assistant_text: &str) {
        self.turns.push_back(MemoryTurn {
            user: user_text.to_string(),
            assistant: assistant_text.to_string(),
        });
        self.prune().await;
    }

    /// Seed the buffer from previously persisted turns, oldest first.
    pub async fn prime(&mut self, records: &[TurnRecord]) {
        self.turns.extend(records.iter().map(|r| MemoryTurn {
            user: r.question().to_string(),
            assistant: r.response().to_string(),
        }));
        self.prune().await;
    }

    /// The summary followed by the verbatim turns, ready to prefix a prompt.
    pub fn get_context(&self) -> String {
        let buffer = self.buffer_text();
        match (self.summary.is_empty(), buffer.is_empty()) {
            (true, _) => buffer,
            (false, true) => format!("System: {}", self.summary),
            (false, false) => format!("System: {}\n{buffer}", self.summary),
        }
    }

    /// Capture the current summary and buffer.
    pub fn checkpoint(&self) -> MemoryCheckpoint {
        MemoryCheckpoint {
            summary: self.summary.clone(),
            turns: self.turns.clone(),
        }
    }

    /// Return to a previously captured state.
    pub fn restore(&mut self, checkpoint: MemoryCheckpoint) {
        self.summary = checkpoint.summary;
        self.turns = checkpoint.turns;
    }

    pub fn clear(&mut self) {
        self.summary.clear();
        self.turns.clear();
    }

    fn buffer_text(&self) -> String {
        self.turns
            .iter()
            .map(MemoryTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Move the oldest turns out of the buffer until it fits the budget
    /// (always keeping the newest turn), then fold them into the summary.
    ///
    /// If summarization fails the pruned turns go back into the buffer.
    async fn prune(&mut self) {
        let mut pruned = Vec::new();
        while self.turns.len() > 1 && self.estimated_tokens() > self.max_token_limit {
            pruned.extend(self.turns.pop_front());
        }
        if pruned.is_empty() {
            return;
        }

        match self.summarize(&pruned).await {
            Ok(summary) => {
                debug!(
                    pruned = pruned.len(),
                    kept = self.turns.len(),
                    summary_len = summary.len(),
                    "conversation summary updated"
                );
                self.summary = summary;
            }
            Err(e) => {
                warn!(error = %e, "failed to summarize conversation, keeping turns verbatim");
                for turn in pruned.into_iter().rev() {
                    self.turns.push_front(turn);
                }
            }
        }
    }

    async fn summarize(&self, pruned: &[MemoryTurn]) -> Result<String, BedrockError> {
        let new_lines = pruned
            .iter()
            .map(MemoryTurn::render)
            .collect::<Vec<_>>()
            .join("\n");
        let previous = if self.summary.is_empty() {
            "(none)"
        } else {
            self.summary.as_str()
        };
        let prompt = format!(
            "Current summary:\n{previous}\n\nNew lines of conversation:\n{new_lines}\n\nNew summary:"
        );

        let reply = self
            .summarizer
            .invoke(ChatRequest::prompt(prompt).with_system(SUMMARY_PROMPT))
            .await?;
        Ok(reply.text.trim().to_string())
    }
}
