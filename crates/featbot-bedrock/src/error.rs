use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("knowledge base retrieval failed: {0}")]
    Retrieval(String),

    #[error("knowledge base returned no results")]
    EmptyRetrieval,
}
