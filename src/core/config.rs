

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{PartscoutError, Result};


pub const ENV_PREFIX: &str = "PARTSCOUT";

pub const DEFAULT_CONFIG_FILE: &str = "partscout.toml";


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    #[default]
    Helix,
    Memory,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Semantic results kept after post-filtering.
    pub semantic_top_k: usize,
    /// Neighbours requested per kept result, to leave room for brand filtering.
    pub oversample_factor: usize,
    pub max_context_results: usize,
    pub max_text_chars: usize,
    pub max_listed_models: usize,
}

impl RouterConfig {

    pub fn candidate_pool(&self) -> usize {
        self.semantic_top_k.max(1) * self.oversample_factor.max(1)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            semantic_top_k: 5,
            oversample_factor: 3,
            max_context_results: 10,
            max_text_chars: 600,
            max_listed_models: 15,
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartscoutConfig {

    pub catalog_backend: CatalogBackend,
    pub catalog_path: Option<String>,


    pub helix_host: String,
    pub helix_port: u16,
    pub timeout: u64,


    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,


    pub llm_model: String,
    pub llm_url: String,
    pub llm_temperature: f64,

    pub router: RouterConfig,
}

impl PartscoutConfig {

    pub fn helix_url(&self) -> String {
        format!("http://{}:{}", self.helix_host, self.helix_port)
    }


    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let builder = config::Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env_source());

        let config = Self::from_builder(builder)?;
        info!(
            "Configuration loaded: backend={:?}, embedding={}/{}, llm={}",
            config.catalog_backend, config.embedding_provider, config.embedding_model, config.llm_model
        );
        Ok(config)
    }


    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }



    pub fn validate(&self) -> Result<()> {
        if self.catalog_backend == CatalogBackend::Memory && self.catalog_path.is_none() {
            return Err(PartscoutError::Validation(
                "catalog_path is required when catalog_backend = memory".to_string(),
            ));
        }
        if self.router.semantic_top_k == 0 || self.router.max_context_results == 0 {
            return Err(PartscoutError::Validation(
                "router.semantic_top_k and router.max_context_results must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder.build()?.try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }
}

/// `PARTSCOUT__<FIELD>`, with `__` descending into nested tables
/// (`PARTSCOUT__ROUTER__SEMANTIC_TOP_K`).
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}


impl Default for PartscoutConfig {
    fn default() -> Self {
        Self {
            catalog_backend: CatalogBackend::Helix,
            catalog_path: None,

            helix_host: "localhost".to_string(),
            helix_port: crate::DEFAULT_HELIX_PORT,
            timeout: 30,

            embedding_provider: "ollama".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,

            llm_model: crate::DEFAULT_LLM_MODEL.to_string(),
            llm_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            llm_temperature: 0.2,

            router: RouterConfig::default(),
        }
    }
}
