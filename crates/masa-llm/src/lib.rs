pub mod types;
pub mod traits;
pub mod config;
pub mod anthropic;
pub mod openai;
pub mod embeddings;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, EmbeddingClient, TokenUsage};
pub use types::Message;
pub use anthropic::AnthropicClient;
pub use openai::OpenAIClient;
pub use embeddings::MistralEmbeddingClient;
pub use config::{ClientFactory, ProviderConfig, ProviderType};
