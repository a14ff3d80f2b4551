//! Chat completion through the Bedrock Converse API.
//!
//! ## Required IAM permissions
//!
//! ```text
//! bedrock:InvokeModel
//! ```

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BedrockError;
use crate::service::{BoxFuture, ChatReply, ChatRequest, ChatRole, ChatService};
use crate::tokens;

/// Model and sampling parameters for chat calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatModelSettings {
    pub model_id: String,
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl Default for ChatModelSettings {
    fn default() -> Self {
        Self {
            model_id: "anthropic.claude-3-haiku-20240307-v1:0".to_string(),
            max_tokens: 300,
            temperature: 0.1,
            top_p: 0.9,
            stop_sequences: vec!["\n\nHuman:".to_string()],
        }
    }
}

impl ChatModelSettings {
    fn inference_config(&self) -> InferenceConfiguration {
        let stop_sequences = if self.stop_sequences.is_empty() {
            None
        } else {
            Some(self.stop_sequences.clone())
        };
        InferenceConfiguration::builder()
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .set_stop_sequences(stop_sequences)
            .build()
    }
}

/// [`ChatService`] backed by a Bedrock runtime client.
#[derive(Debug, Clone)]
pub struct BedrockChat {
    client: aws_sdk_bedrockruntime::Client,
    settings: ChatModelSettings,
}

impl BedrockChat {
    pub fn new(config: &aws_config::SdkConfig, settings: ChatModelSettings) -> Self {
        Self::from_client(aws_sdk_bedrockruntime::Client::new(config), settings)
    }

    pub fn from_client(
        client: aws_sdk_bedrockruntime::Client,
        settings: ChatModelSettings,
    ) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ChatModelSettings {
        &self.settings
    }

    /// Send a conversation to Bedrock and return the assistant's reply.
    pub async fn converse(&self, request: ChatRequest) -> Result<ChatReply, BedrockError> {
        let model_id = self.settings.model_id.as_str();

        let mut converse_messages: Vec<Message> = Vec::with_capacity(request.messages.len());
        for msg in request.messages {
            let role = match msg.role {
                ChatRole::User => ConversationRole::User,
                ChatRole::Assistant => ConversationRole::Assistant,
            };
            let message = Message::builder()
                .role(role)
                .content(ContentBlock::Text(msg.content))
                .build()
                .map_err(|e| BedrockError::Invocation(e.to_string()))?;
            converse_messages.push(message);
        }

        debug!(model_id, messages = converse_messages.len(), "invoking chat model");

        let response = self
            .client
            .converse()
            .model_id(model_id)
            .set_system(request.system.map(|s| vec![SystemContentBlock::Text(s)]))
            .set_messages(Some(converse_messages))
            .inference_config(self.settings.inference_config())
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(BedrockError::EmptyResponse);
        }

        let usage = response.usage().map(tokens::extract_token_usage);
        if let Some(u) = usage {
            info!(
                model_id,
                input_tokens = u.input,
                output_tokens = u.output,
                total_tokens = u.total(),
                "chat model replied"
            );
        }

        Ok(ChatReply { text, usage })
    }
}

impl ChatService for BedrockChat {
    fn invoke(&self, request: ChatRequest) -> BoxFuture<'_, Result<ChatReply, BedrockError>> {
        Box::pin(self.converse(request))
    }
}
