

pub mod core;
pub mod db;
pub mod llm;
pub mod mcp;
pub mod search;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use core::config::{PartscoutConfig, RouterConfig};
pub use core::error::{PartscoutError, Result};
pub use db::{CatalogStore, HelixCatalog, HelixClient, HelixClientError, InMemoryCatalog, ProductRecord};
pub use llm::assistant::{AssistantReply, PartsAssistant};
pub use llm::embeddings::{Embedder, EmbeddingGenerator};
pub use search::router::{QueryAnalysis, QueryRouter, QueryType, RouterError, RoutedResults};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_LLM_MODEL: &str = "llama3.1:8b";


pub const DEFAULT_HELIX_PORT: u16 = 6969;


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
