

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::providers::base::{LlmMetadata, LlmProvider, LlmProviderError};
use crate::search::router::{format_context, QueryAnalysis, QueryRouter};


const SYSTEM_PROMPT: &str = r#"You are a customer support assistant for an appliance replacement-parts store.
You help with refrigerator and dishwasher parts only: finding parts, checking model compatibility,
installation steps and troubleshooting.

Rules:
- Answer from the product context when it is provided. Quote part numbers exactly as given.
- Never invent part numbers, prices, availability or compatibility.
- If the context does not answer the question, say so and ask for the part or model number.
- If the question is unrelated to refrigerator or dishwasher parts, politely decline."#;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub answer: String,
    pub analysis: Option<QueryAnalysis>,
    pub products: Vec<String>,
    pub context_used: bool,
    pub retrieval_failed: bool,
    pub metadata: LlmMetadata,
}


pub struct PartsAssistant<P: LlmProvider> {
    router: Arc<QueryRouter>,
    provider: P,
}

impl<P: LlmProvider> PartsAssistant<P> {

    #[must_use]
    pub fn new(router: Arc<QueryRouter>, provider: P) -> Self {
        Self { router, provider }
    }

    /// Route the question, format whatever was found, and ask the provider.
    /// Retrieval failures are logged and the question is answered with a
    /// prompt saying the catalog could not be checked; provider failures are
    /// returned.
    pub async fn answer(&self, question: &str) -> Result<AssistantReply, LlmProviderError> {
        info!("Answering question: {}...", crate::safe_truncate(question, 50));

        let (analysis, products, context, retrieval_failed) = match self.router.route(question).await {
            Ok(routed) => {
                let context = format_context(&routed, question, self.router.config());
                let products = routed.product_ids();
                (Some(routed.analysis), products, context, false)
            }
            Err(e) => {
                warn!("Retrieval failed, answering without product context: {}", e);
                (None, Vec::new(), None, true)
            }
        };

        let lookup = match (&context, retrieval_failed) {
            (Some(context), _) => Lookup::Found(context),
            (None, true) => Lookup::Unavailable,
            (None, false) => Lookup::NoMatches,
        };
        let user_prompt = build_user_prompt(question, lookup);
        debug!(
            "Assistant prompt: {} chars, context={}, retrieval_failed={}",
            user_prompt.len(),
            context.is_some(),
            retrieval_failed
        );

        let (answer, metadata) = self.provider.generate(SYSTEM_PROMPT, &user_prompt, None).await?;

        Ok(AssistantReply {
            answer,
            analysis,
            products,
            context_used: context.is_some(),
            retrieval_failed,
            metadata,
        })
    }
}


enum Lookup<'a> {
    Found(&'a str),
    NoMatches,
    Unavailable,
}


fn build_user_prompt(question: &str, lookup: Lookup<'_>) -> String {
    match lookup {
        Lookup::Found(context) => format!(
            "{}\n\nCustomer question: {}\n\nAnswer using the product context above.",
            context, question
        ),
        Lookup::NoMatches => format!(
            "No matching products were found in the catalog.\n\nCustomer question: {}",
            question
        ),
        Lookup::Unavailable => format!(
            "Product lookup is temporarily unavailable, so the catalog could not be checked. \
             Do not say the part does not exist; ask the customer to try again shortly.\n\n\
             Customer question: {}",
            question
        ),
    }
}
