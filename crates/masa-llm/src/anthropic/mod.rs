mod client;

pub use client::{AnthropicClient, DEFAULT_ANTHROPIC_MODEL};
