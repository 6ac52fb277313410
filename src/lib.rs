//! Telegram relay bot for SambaNova chat completions.
//!
//! Inbound text and photos are relayed to an OpenAI-compatible
//! chat-completion endpoint with a persona-specific system prompt, bounded
//! retry around the HTTP call, and chunked replies. An optional single-owner
//! access gate restricts the bot to one Telegram user.

pub mod bot;
pub mod config;
pub mod llm;
pub mod personas;
pub mod supervisor;
pub mod utils;
