//! In-process extraction

use async_trait::async_trait;

use crate::{ExtractedInvoice, Result, extract::extract};

use super::Extractor;

/// Runs the regex heuristic in-process. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for LocalExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedInvoice> {
        Ok(extract(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_matches_pure_function() {
        let text = "Logo design. $500 due by June 10";
        let result = LocalExtractor::new().extract(text).await.unwrap();
        assert_eq!(result, extract(text));
    }

    #[tokio::test]
    async fn test_local_empty_input_is_ok() {
        let result = LocalExtractor::new().extract("").await.unwrap();
        assert!(!result.is_complete());
    }
}
