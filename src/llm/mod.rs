

pub mod assistant;
pub mod embeddings;
pub mod providers;

pub use assistant::{AssistantReply, PartsAssistant};
pub use embeddings::{Embedder, EmbeddingError, EmbeddingGenerator};
pub use providers::{LlmMetadata, LlmProvider, LlmProviderError, OllamaProvider};
