mod mistral;

pub use mistral::{MistralEmbeddingClient, MISTRAL_EMBED_MODEL};
