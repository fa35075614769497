

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use helix_rs::{HelixDB, HelixDBClient, HelixError};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};


const MAX_RETRIES: u32 = 3;

const INITIAL_RETRY_DELAY_MS: u64 = 100;

const MAX_RETRY_DELAY_MS: u64 = 5000;


#[derive(Debug, Error)]
pub enum HelixClientError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("No value for query {0}")]
    NotFound(String),
    #[error("Helix error: {0}")]
    Helix(#[from] HelixError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Retry exhausted after {0} attempts: {1}")]
    RetryExhausted(u32, String),
}

impl HelixClientError {

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}


fn looks_like_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not found") || lower.contains("no value")
}


/// Thin wrapper over the HelixDB SDK. Retries transient failures with
/// exponential backoff; "not found" answers are returned immediately.
pub struct HelixClient {
    inner: HelixDB,
    is_connected: AtomicBool,
    base_url: String,
}

impl HelixClient {

    pub fn new(host: &str, port: u16) -> Result<Self, HelixClientError> {
        if host.trim().is_empty() {
            return Err(HelixClientError::Connection("empty host".to_string()));
        }

        let endpoint = format!("http://{}", host);
        let base_url = format!("http://{}:{}", host, port);

        let inner = <HelixDB as HelixDBClient>::new(
            Some(&endpoint),
            Some(port),
            None,
        );

        info!("HelixClient created for {}", base_url);

        Ok(Self {
            inner,
            is_connected: AtomicBool::new(false),
            base_url,
        })
    }


    pub async fn execute_query<T, P>(&self, query_name: &str, params: &P) -> Result<T, HelixClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let mut last_error = None;
        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);

        for attempt in 1..=MAX_RETRIES {
            debug!("Executing query: {} (attempt {})", query_name, attempt);

            match self.inner.query::<P, T>(query_name, params).await {
                Ok(result) => {
                    self.is_connected.store(true, Ordering::Relaxed);
                    debug!("Query {} succeeded", query_name);
                    return Ok(result);
                }
                Err(e) => {
                    let err_str = e.to_string();

                    if looks_like_not_found(&err_str) {
                        debug!("Query {} returned not found", query_name);
                        return Err(HelixClientError::NotFound(query_name.to_string()));
                    }

                    debug!("Query {} failed (attempt {}/{}): {}", query_name, attempt, MAX_RETRIES, e);
                    last_error = Some(err_str);

                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS));
                    }
                }
            }
        }

        self.is_connected.store(false, Ordering::Relaxed);
        Err(HelixClientError::RetryExhausted(
            MAX_RETRIES,
            last_error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }


    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }


    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HelixClient::new("localhost", 6969).unwrap();
        assert_eq!(client.base_url(), "http://localhost:6969");
        assert!(!client.is_connected());
    }

    #[test]
    fn test_client_rejects_empty_host() {
        assert!(HelixClient::new("  ", 6969).is_err());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(looks_like_not_found("Query getProductById: No value found"));
        assert!(looks_like_not_found("404 Not Found"));
        assert!(!looks_like_not_found("connection refused"));
        assert!(HelixClientError::NotFound("getProductById".into()).is_not_found());
    }
}
