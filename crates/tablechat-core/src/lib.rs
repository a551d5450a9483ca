//! Core of tablechat: provider settings, the settings loader, and the chat
//! types every LLM client speaks.

pub mod config;
pub mod types;
pub mod utils;
