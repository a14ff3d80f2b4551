#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use featbot_bedrock::error::BedrockError;
use featbot_bedrock::service::{
    BoxFuture, ChatReply, ChatRequest, ChatService, KnowledgeBaseAnswer, RetrievalService,
};
use featbot_core::models::turn::SourceDescriptor;

/// Chat service that replays scripted replies and records every request.
/// Once the script runs out it echoes a fixed reply.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: impl IntoIterator<Item = Result<&'static str, &'static str>>) -> Arc<Self> {
        let replies = replies
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// No scripted replies: every call gets the fallback reply.
    pub fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> String {
        let requests = self.requests.lock().unwrap();
        let last = requests.last().expect("no chat request was made");
        last.messages.last().expect("request has no messages").content.clone()
    }
}

impl ChatService for ScriptedChat {
    fn invoke(&self, request: ChatRequest) -> BoxFuture<'_, Result<ChatReply, BedrockError>> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("summary of earlier turns".to_string()));
        Box::pin(async move {
            next.map(|text| ChatReply { text, usage: None })
                .map_err(BedrockError::Invocation)
        })
    }
}

/// Knowledge base that always answers with the same text and sources.
pub struct FixedKnowledgeBase {
    pub answer: String,
    pub sources: Vec<SourceDescriptor>,
}

impl FixedKnowledgeBase {
    pub fn new(answer: &str, locations: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            sources: locations.iter().map(|l| source(l)).collect(),
        })
    }
}

impl RetrievalService for FixedKnowledgeBase {
    fn retrieve(&self, _query: String) -> BoxFuture<'_, Result<KnowledgeBaseAnswer, BedrockError>> {
        let answer = KnowledgeBaseAnswer {
            answer: self.answer.clone(),
            sources: self.sources.clone(),
        };
        Box::pin(async move { Ok(answer) })
    }
}

/// Knowledge base whose every call fails.
pub struct UnreachableKnowledgeBase;

impl RetrievalService for UnreachableKnowledgeBase {
    fn retrieve(&self, _query: String) -> BoxFuture<'_, Result<KnowledgeBaseAnswer, BedrockError>> {
        Box::pin(async { Err(BedrockError::Retrieval("AccessDeniedException".to_string())) })
    }
}

pub fn source(location: &str) -> SourceDescriptor {
    serde_json::json!({ "location": location })
        .as_object()
        .cloned()
        .unwrap()
}
