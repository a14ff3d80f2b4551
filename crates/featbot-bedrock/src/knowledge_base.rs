//! Knowledge-base question answering through Bedrock Knowledge Bases.
//!
//! A single `RetrieveAndGenerate` call runs the vector search against the
//! knowledge base and asks the configured model to answer from the top
//! results. The answer text plus the metadata of every cited reference is
//! returned; the orchestrator uses the answer to ground its own prompt.
//!
//! ## Required IAM permissions
//!
//! ```text
//! bedrock:RetrieveAndGenerate
//! bedrock:Retrieve
//! bedrock:InvokeModel
//! ```

use std::collections::HashMap;

use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseRetrievalConfiguration, KnowledgeBaseRetrieveAndGenerateConfiguration,
    KnowledgeBaseVectorSearchConfiguration, RetrieveAndGenerateConfiguration,
    RetrieveAndGenerateInput, RetrieveAndGenerateType,
};
use aws_smithy_types::{Document, Number};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use featbot_core::models::turn::SourceDescriptor;

use crate::error::BedrockError;
use crate::service::{BoxFuture, KnowledgeBaseAnswer, RetrievalService};

/// Key under which the source document's S3 URI is recorded.
pub const LOCATION_KEY: &str = "location";

/// Which knowledge base to query and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseSettings {
    pub knowledge_base_id: String,
    /// Model used to generate the grounded answer, as a foundation model ARN.
    pub model_arn: String,
    pub number_of_results: i32,
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self {
            knowledge_base_id: "JOLJ0BNXVX".to_string(),
            model_arn: "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2:1"
                .to_string(),
            number_of_results: 4,
        }
    }
}

/// [`RetrievalService`] backed by a Bedrock agent runtime client.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseClient {
    client: aws_sdk_bedrockagentruntime::Client,
    settings: KnowledgeBaseSettings,
}

impl KnowledgeBaseClient {
    pub fn new(config: &aws_config::SdkConfig, settings: KnowledgeBaseSettings) -> Self {
        Self::from_client(aws_sdk_bedrockagentruntime::Client::new(config), settings)
    }

    pub fn from_client(
        client: aws_sdk_bedrockagentruntime::Client,
        settings: KnowledgeBaseSettings,
    ) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &KnowledgeBaseSettings {
        &self.settings
    }

    /// Ask the knowledge base a question.
    ///
    /// Fails with [`BedrockError::EmptyRetrieval`] when the answer is blank
    /// or no reference documents were cited.
    pub async fn retrieve_and_generate(
        &self,
        query: &str,
    ) -> Result<KnowledgeBaseAnswer, BedrockError> {
        let kb_id = self.settings.knowledge_base_id.as_str();

        let input = RetrieveAndGenerateInput::builder()
            .text(query)
            .build()
            .map_err(|e| BedrockError::Retrieval(e.to_string()))?;

        let retrieval = KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(
                KnowledgeBaseVectorSearchConfiguration::builder()
                    .number_of_results(self.settings.number_of_results)
                    .build(),
            )
            .build();

        let kb_config = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(kb_id)
            .model_arn(&self.settings.model_arn)
            .retrieval_configuration(retrieval)
            .build()
            .map_err(|e| BedrockError::Retrieval(e.to_string()))?;

        let config = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(kb_config)
            .build()
            .map_err(|e| BedrockError::Retrieval(e.to_string()))?;

        debug!(kb_id, "querying knowledge base");

        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(config)
            .send()
            .await
            .map_err(|e| BedrockError::Retrieval(e.into_service_error().to_string()))?;

        let answer = response
            .output()
            .map(|o| o.text().to_string())
            .unwrap_or_default();

        let mut sources: Vec<SourceDescriptor> = Vec::new();
        for reference in response
            .citations()
            .iter()
            .flat_map(|c| c.retrieved_references())
        {
            let uri = reference
                .location()
                .and_then(|l| l.s3_location())
                .and_then(|s3| s3.uri());
            let descriptor = source_descriptor(reference.metadata(), uri);
            // The same reference is cited once per answer span that uses it.
            if !sources.contains(&descriptor) {
                sources.push(descriptor);
            }
        }

        if answer.trim().is_empty() || sources.is_empty() {
            return Err(BedrockError::EmptyRetrieval);
        }

        info!(kb_id, sources = sources.len(), "knowledge base answered");

        Ok(KnowledgeBaseAnswer { answer, sources })
    }
}

impl RetrievalService for KnowledgeBaseClient {
    fn retrieve(&self, query: String) -> BoxFuture<'_, Result<KnowledgeBaseAnswer, BedrockError>> {
        Box::pin(async move { self.retrieve_and_generate(&query).await })
    }
}

/// Build the stored description of one retrieved reference from its
/// metadata and S3 location.
///
/// An explicit `location` key in the metadata wins over the S3 URI.
pub fn source_descriptor(
    metadata: Option<&HashMap<String, Document>>,
    uri: Option<&str>,
) -> SourceDescriptor {
    let mut descriptor: SourceDescriptor = metadata
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), document_to_json(v)))
        .collect();

    if let Some(uri) = uri {
        descriptor
            .entry(LOCATION_KEY)
            .or_insert_with(|| Value::String(uri.to_string()));
    }

    descriptor
}

/// Convert a Smithy document into the equivalent JSON value.
///
/// Non-finite floats have no JSON form and become `null`.
pub fn document_to_json(doc: &Document) -> Value {
    match doc {
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
        Document::Array(items) => Value::Array(items.iter().map(document_to_json).collect()),
        Document::Number(Number::PosInt(n)) => Value::from(*n),
        Document::Number(Number::NegInt(n)) => Value::from(*n),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Document::String(s) => Value::String(s.clone()),
        Document::Bool(b) => Value::Bool(*b),
        Document::Null => Value::Null,
    }
}
