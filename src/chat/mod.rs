//! Chat-completion client (spec.md §4.7).

mod client;
mod types;

pub use client::ChatClient;
pub use types::{ChatChoice, ChatMessage, ChatRequest, ChatResponse};
