

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::{CatalogBackend, PartscoutConfig};
use crate::db::{CatalogStore, HelixCatalog, HelixClient, InMemoryCatalog};
use crate::llm::assistant::PartsAssistant;
use crate::llm::embeddings::{Embedder, EmbeddingGenerator};
use crate::llm::providers::{LlmProvider, LlmProviderError, OllamaProvider};
use crate::search::router::{
    Confidence, MatchReason, Origin, QueryRouter, QueryType, RouterError, RetrievalResult,
};
use crate::search::vector::VectorIndex;


#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
pub struct SearchPartsParams {
    #[schemars(description = "Customer question or search text, e.g. 'Is PS11752778 compatible with WDT780SAEM1?'")]
    pub query: String,
}

#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
pub struct ClassifyQueryParams {
    #[schemars(description = "Query to analyze")]
    pub query: String,
}

#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
pub struct AskPartsParams {
    #[schemars(description = "Question about refrigerator or dishwasher parts")]
    pub question: String,
}


#[derive(Debug, Serialize)]
struct PartHit {
    part_number: String,
    name: String,
    brand: String,
    origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
    match_reasons: Vec<MatchReason>,
}

impl From<&RetrievalResult> for PartHit {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            part_number: result.record.part_number.clone(),
            name: result.record.name.clone(),
            brand: result.record.brand.clone(),
            origin: result.origin,
            score: result.relevance_score,
            match_reasons: result.match_reasons.clone(),
        }
    }
}


#[derive(Debug, Serialize)]
struct SearchPartsResponse {
    query_type: QueryType,
    confidence: Confidence,
    part_numbers: Vec<String>,
    model_numbers: Vec<String>,
    brands: Vec<String>,
    structured_count: usize,
    semantic_count: usize,
    results: Vec<PartHit>,
    context: Option<String>,
}


#[derive(Clone)]
pub struct PartscoutMcpServer {
    router: Arc<QueryRouter>,
    assistant: Arc<PartsAssistant<Arc<dyn LlmProvider>>>,
    tool_router: ToolRouter<Self>,
}

impl PartscoutMcpServer {

    pub fn new(router: Arc<QueryRouter>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            assistant: Arc::new(PartsAssistant::new(router.clone(), provider)),
            router,
            tool_router: Self::tool_router(),
        }
    }


    fn router_error(err: RouterError) -> McpError {
        match err {
            RouterError::PatternTable(msg) => McpError::invalid_params(msg, None),
            other => McpError::internal_error(other.to_string(), None),
        }
    }


    fn llm_error(err: LlmProviderError) -> McpError {
        McpError::internal_error(err.to_string(), None)
    }


    fn require_text(value: &str, field: &str) -> Result<(), McpError> {
        if value.trim().is_empty() {
            return Err(McpError::invalid_params(format!("{} must not be empty", field), None));
        }
        Ok(())
    }


    fn result_to_json<T: Serialize>(result: T) -> Result<String, McpError> {
        serde_json::to_string_pretty(&result)
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

#[tool_router]
impl PartscoutMcpServer {

    #[tool(description = "Hybrid parts search. Extracts part/model numbers and brands, picks exact catalog lookup and/or semantic search by intent, and returns ranked products plus a ready-to-use context block. Returns: {query_type, confidence, part_numbers, model_numbers, brands, results, context}")]
    async fn search_parts(
        &self,
        Parameters(params): Parameters<SearchPartsParams>,
    ) -> Result<CallToolResult, McpError> {
        Self::require_text(&params.query, "query")?;
        info!("🔍 search_parts: '{}'", crate::safe_truncate(&params.query, 50));

        let (routed, context) = self
            .router
            .route_with_context(&params.query)
            .await
            .map_err(Self::router_error)?;

        let response = SearchPartsResponse {
            query_type: routed.analysis.query_type,
            confidence: routed.analysis.confidence,
            part_numbers: routed.analysis.entities.part_numbers.clone(),
            model_numbers: routed.analysis.entities.model_numbers.clone(),
            brands: routed.analysis.entities.brands.clone(),
            structured_count: routed.structured_matches.len(),
            semantic_count: routed.semantic_matches.len(),
            results: routed.combined.iter().map(PartHit::from).collect(),
            context,
        };

        info!("✅ {} results ({})", response.results.len(), response.query_type);
        let json = Self::result_to_json(&response)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "Classify a query without retrieving anything. Returns: {part_numbers, model_numbers, brands, query_type, use_structured_lookup, use_semantic_search, confidence}")]
    async fn classify_query(
        &self,
        Parameters(params): Parameters<ClassifyQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let analysis = self.router.analyze(&params.query);
        let json = Self::result_to_json(&analysis)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "Answer a customer question about refrigerator or dishwasher parts using retrieved catalog context. Returns: {answer, analysis, products, context_used, retrieval_failed, metadata}")]
    async fn ask_parts(
        &self,
        Parameters(params): Parameters<AskPartsParams>,
    ) -> Result<CallToolResult, McpError> {
        Self::require_text(&params.question, "question")?;
        info!("💬 ask_parts: '{}'", crate::safe_truncate(&params.question, 50));

        let reply = self
            .assistant
            .answer(&params.question)
            .await
            .map_err(Self::llm_error)?;

        if reply.retrieval_failed {
            warn!("Answered while product lookup was unavailable");
        } else if !reply.context_used {
            warn!("Answered without product context");
        }

        let json = Self::result_to_json(&reply)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}


#[tool_handler]
impl ServerHandler for PartscoutMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "partscout".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Replacement-part assistant for refrigerators and dishwashers. Use search_parts to \
                 retrieve products for a question, classify_query to inspect how a question would \
                 be routed, and ask_parts for a generated answer grounded in the catalog."
                    .to_string(),
            ),
        }
    }
}


async fn build_router(config: &PartscoutConfig) -> anyhow::Result<QueryRouter> {
    let embedder = Arc::new(EmbeddingGenerator::from_config(config));

    let (catalog, index): (Arc<dyn CatalogStore>, Arc<dyn VectorIndex>) = match config.catalog_backend {
        CatalogBackend::Helix => {
            let client = Arc::new(HelixClient::new(&config.helix_host, config.helix_port)?);
            let catalog = Arc::new(HelixCatalog::new(client));
            (catalog.clone() as Arc<dyn CatalogStore>, catalog as Arc<dyn VectorIndex>)
        }
        CatalogBackend::Memory => {
            let path = config
                .catalog_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("catalog_path is required for the memory backend"))?;
            let catalog = Arc::new(InMemoryCatalog::load_json(path)?);
            catalog.index_embeddings(embedder.as_ref()).await?;
            (catalog.clone() as Arc<dyn CatalogStore>, catalog as Arc<dyn VectorIndex>)
        }
    };

    let embedder: Arc<dyn Embedder> = embedder;
    Ok(QueryRouter::new(catalog, embedder, index, config.router.clone()))
}


pub async fn run_server() -> anyhow::Result<()> {
    info!("🚀 Initializing partscout MCP server...");

    let config = PartscoutConfig::from_env()?;
    let router = Arc::new(build_router(&config).await?);
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::from_config(&config));

    info!("✅ partscout MCP server ready");
    match config.catalog_backend {
        CatalogBackend::Helix => info!("   📍 HelixDB: {}", config.helix_url()),
        CatalogBackend::Memory => info!("   📦 Catalog file: {}", config.catalog_path.as_deref().unwrap_or("-")),
    }
    info!("   🤖 LLM: ollama/{}", config.llm_model);
    info!("   🧮 Embeddings: {}/{}", config.embedding_provider, config.embedding_model);

    let server = PartscoutMcpServer::new(router, provider);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::core::RouterConfig;
    use crate::db::ProductRecord;
    use crate::llm::embeddings::EmbeddingError;
    use crate::llm::providers::LlmMetadata;

    struct FlatEmbedder;

    #[async_trait]
    impl Embedder for FlatEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct CannedProvider;

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _response_format: Option<&str>,
        ) -> Result<(String, LlmMetadata), LlmProviderError> {
            Ok(("PS11752778 fits that model.".to_string(), LlmMetadata::default()))
        }

        fn provider_name(&self) -> &str {
            "canned"
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn server() -> PartscoutMcpServer {
        let catalog = Arc::new(InMemoryCatalog::from_products(vec![ProductRecord {
            part_number: "PS11752778".into(),
            name: "Upper Rack".into(),
            brand: "Whirlpool".into(),
            compatible_models: vec!["WDT780SAEM1".into()],
            ..Default::default()
        }]));
        let router = QueryRouter::new(catalog.clone(), Arc::new(FlatEmbedder), catalog, RouterConfig::default());
        PartscoutMcpServer::new(Arc::new(router), Arc::new(CannedProvider))
    }

    fn text_of(result: &CallToolResult) -> String {
        serde_json::to_value(&result.content[0]).unwrap()["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_search_parts_tool() {
        let result = server()
            .search_parts(Parameters(SearchPartsParams {
                query: "Is PS11752778 compatible with WDT780SAEM1?".into(),
            }))
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(json["query_type"], "compatibility");
        assert_eq!(json["results"][0]["part_number"], "PS11752778");
        assert_eq!(json["results"][0]["origin"], "structured");
        assert!(json["context"].as_str().unwrap().contains("EXACT MATCH"));
    }

    #[tokio::test]
    async fn test_search_parts_rejects_blank_query() {
        let err = server()
            .search_parts(Parameters(SearchPartsParams { query: "  ".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_classify_query_tool() {
        let result = server()
            .classify_query(Parameters(ClassifyQueryParams { query: "hello".into() }))
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(json["query_type"], "general");
        assert_eq!(json["use_semantic_search"], false);
    }

    #[tokio::test]
    async fn test_ask_parts_tool() {
        let result = server()
            .ask_parts(Parameters(AskPartsParams {
                question: "Does PS11752778 fit WDT780SAEM1?".into(),
            }))
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(json["answer"], "PS11752778 fits that model.");
        assert_eq!(json["context_used"], true);
        assert_eq!(json["retrieval_failed"], false);
        assert_eq!(json["products"][0], "PS11752778");
    }
}
