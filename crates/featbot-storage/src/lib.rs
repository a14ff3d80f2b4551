//! featbot-storage
//!
//! Local persistence of conversation history as a single JSON document.

pub mod error;
pub mod history;
