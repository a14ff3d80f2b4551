//! featbot-chat
//!
//! Conversation logic: the summarizing memory buffer, the prompt
//! orchestrator that ties retrieval, chat and history together, and the
//! connectivity check.

pub mod connectivity;
pub mod error;
pub mod memory;
pub mod orchestrator;
