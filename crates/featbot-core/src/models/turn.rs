use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Metadata describing one retrieved source document.
///
/// The shape is owned by the retrieval service; featbot stores and renders
/// it without interpreting any keys.
pub type SourceDescriptor = serde_json::Map<String, serde_json::Value>;

/// One completed exchange: the user's question, the model's response, and
/// the knowledge-base sources the response was grounded on (if any).
///
/// Records are created once per exchange and never mutated afterwards.
/// Both `question` and `response` are guaranteed non-empty, including for
/// records read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TurnRecordRepr")]
pub struct TurnRecord {
    question: String,
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<Vec<SourceDescriptor>>,
}

#[derive(Deserialize)]
struct TurnRecordRepr {
    question: String,
    response: String,
    #[serde(default)]
    sources: Option<Vec<SourceDescriptor>>,
}

impl TryFrom<TurnRecordRepr> for TurnRecord {
    type Error = CoreError;

    fn try_from(repr: TurnRecordRepr) -> Result<Self, Self::Error> {
        Self::new(repr.question, repr.response).map(|r| r.with_sources(repr.sources))
    }
}

impl TurnRecord {
    pub fn new(
        question: impl Into<String>,
        response: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let question = question.into();
        let response = response.into();
        if question.trim().is_empty() {
            return Err(CoreError::EmptyField("question"));
        }
        if response.trim().is_empty() {
            return Err(CoreError::EmptyField("response"));
        }
        Ok(Self {
            question,
            response,
            sources: None,
        })
    }

    /// Attach citations. An empty list is stored as "no sources".
    pub fn with_sources(mut self, sources: Option<Vec<SourceDescriptor>>) -> Self {
        self.sources = sources.filter(|s| !s.is_empty());
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn sources(&self) -> Option<&[SourceDescriptor]> {
        self.sources.as_deref()
    }
}
