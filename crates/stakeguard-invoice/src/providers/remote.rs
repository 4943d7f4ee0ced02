//! Extraction delegated to an HTTP endpoint

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{
    ExtractedInvoice,
    error::{Error, Result},
};

use super::{Extractor, RetryConfig};

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
}

/// Shape every response body must have before it is trusted.
fn response_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "required": ["success"],
        "properties": {
            "success": { "type": "boolean" },
            "error": { "type": "string" },
            "data": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "amount": { "type": ["number", "null"] },
                    "deadline": { "type": ["string", "null"] },
                    "isComplete": { "type": "boolean" }
                }
            }
        }
    })
}

/// Client for a `POST { text }` -> `{ success, data }` extraction endpoint
pub struct RemoteExtractor {
    client: reqwest::Client,
    url: String,
    retry_config: RetryConfig,
    validator: Arc<jsonschema::Validator>,
}

impl RemoteExtractor {
    /// Create a client for the endpoint at `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::InvalidConfig("extractor URL is empty".to_string()));
        }
        let validator = jsonschema::validator_for(&response_schema())
            .map_err(|e| Error::InvalidConfig(format!("response schema: {}", e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            url,
            retry_config: RetryConfig::default(),
            validator: Arc::new(validator),
        })
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, text: &str) -> Result<ExtractedInvoice> {
        let response = self
            .client
            .post(&self.url)
            .json(&ExtractRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(Error::api(status.as_u16(), message));
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedPayload(format!("invalid JSON: {}", e)))?;
        self.parse_payload(payload)
    }

    fn parse_payload(&self, payload: Value) -> Result<ExtractedInvoice> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(&payload)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        if !errors.is_empty() {
            return Err(Error::MalformedPayload(errors.join("; ")));
        }

        if payload.get("success").and_then(Value::as_bool) != Some(true) {
            let reason = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::Unsuccessful(reason.to_string()));
        }

        let data = payload
            .get("data")
            .cloned()
            .ok_or_else(|| Error::MalformedPayload("missing data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl Extractor for RemoteExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedInvoice> {
        let mut attempt = 0u32;
        loop {
            match self.request(text).await {
                Ok(extracted) => return Ok(extracted),
                Err(e) if e.is_retryable() && attempt < self.retry_config.max_retries => {
                    let delay = self.retry_config.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Extraction request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                        e,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    async fn extractor_for(server: &MockServer) -> RemoteExtractor {
        RemoteExtractor::new(format!("{}/api/extract-invoice", server.uri()))
            .unwrap()
            .with_retry_config(fast_retry())
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(matches!(RemoteExtractor::new("  "), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_success_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/extract-invoice"))
            .and(body_json(serde_json::json!({ "text": "Logo design. $500 due by June 10" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "title": "Logo design",
                    "description": "$500 due by June 10",
                    "amount": 500,
                    "deadline": "June 10",
                    "isComplete": true
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = extractor_for(&server).await;
        let result = extractor.extract("Logo design. $500 due by June 10").await.unwrap();
        assert_eq!(result.title, "Logo design");
        assert_eq!(result.amount, Some(500.0));
        assert_eq!(result.deadline.as_deref(), Some("June 10"));
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_is_complete_recomputed_from_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "title": "", "description": "", "amount": null, "deadline": null, "isComplete": true }
            })))
            .mount(&server)
            .await;

        let result = extractor_for(&server).await.extract("??").await.unwrap();
        assert!(!result.is_complete());
    }

    #[tokio::test]
    async fn test_unsuccessful_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "Failed to extract invoice details"
            })))
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        match err {
            Error::Unsuccessful(reason) => assert_eq!(reason, "Failed to extract invoice details"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "title": 42 }
            })))
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)), "got: {}", err);
    }

    #[tokio::test]
    async fn test_success_without_data_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })))
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)), "got: {}", err);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)), "got: {}", err);
    }

    #[tokio::test]
    async fn test_server_error_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "Failed to extract invoice details"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to extract invoice details");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
            .expect(1)
            .mount(&server)
            .await;

        let err = extractor_for(&server).await.extract("x").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, .. }), "got: {}", err);
    }
}
