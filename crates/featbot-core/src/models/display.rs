use serde::{Deserialize, Serialize};

use super::turn::{SourceDescriptor, TurnRecord};

/// A message as shown in the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub role: DisplayRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceDescriptor>>,
}

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRole {
    User,
    Assistant,
}

impl DisplayMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: DisplayRole::User,
            text: text.into(),
            sources: None,
        }
    }

    pub fn assistant(text: impl Into<String>, sources: Option<Vec<SourceDescriptor>>) -> Self {
        Self {
            role: DisplayRole::Assistant,
            text: text.into(),
            sources,
        }
    }
}

impl TurnRecord {
    /// Expand into the user message followed by the assistant message.
    pub fn to_display_messages(&self) -> [DisplayMessage; 2] {
        [
            DisplayMessage::user(self.question()),
            DisplayMessage::assistant(self.response(), self.sources().map(<[_]>::to_vec)),
        ]
    }
}

/// Expand a sequence of turn records into transcript messages, two per
/// record, preserving order.
pub fn expand_turns(records: &[TurnRecord]) -> Vec<DisplayMessage> {
    records
        .iter()
        .flat_map(TurnRecord::to_display_messages)
        .collect()
}
