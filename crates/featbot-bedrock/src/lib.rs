//! featbot-bedrock
//!
//! The two external capabilities featbot depends on, chat completion and
//! knowledge-base retrieval, as narrow traits plus their AWS Bedrock
//! implementations.

pub mod chat;
pub mod context;
pub mod error;
pub mod knowledge_base;
pub mod service;
pub mod tokens;
