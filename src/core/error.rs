

use thiserror::Error;

use crate::db::{CatalogError, HelixClientError};
use crate::llm::embeddings::EmbeddingError;
use crate::llm::providers::base::LlmProviderError;
use crate::search::router::RouterError;


#[derive(Error, Debug)]
pub enum PartscoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Routing error: {0}")]
    Router(#[from] RouterError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("HelixDB client error: {0}")]
    HelixClient(#[from] HelixClientError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}


pub type Result<T> = std::result::Result<T, PartscoutError>;
