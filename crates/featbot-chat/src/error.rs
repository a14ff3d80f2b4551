use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyInput,

    #[error(transparent)]
    Bedrock(#[from] featbot_bedrock::error::BedrockError),

    #[error("failed to save history: {0}")]
    Storage(#[from] featbot_storage::error::StorageError),

    #[error(transparent)]
    Core(#[from] featbot_core::error::CoreError),
}
