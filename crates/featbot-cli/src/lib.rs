//! featbot-cli library root.
//!
//! Re-exports internal modules so that integration tests can drive the
//! chat loop and config handling directly.

pub mod aws;
pub mod commands;
pub mod config;
pub mod render;
pub mod session;
