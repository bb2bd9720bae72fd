// Library root, exposes internals for integration tests.
// The binary entry point is src/main.rs.

pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod llm;
pub mod logger;
pub mod relay;
pub mod telegram;
