//! featbot-core
//!
//! Pure domain types shared by every featbot crate: persisted turn records,
//! the display messages derived from them, and token counts.
//! No AWS SDK dependency.

pub mod error;
pub mod models;
