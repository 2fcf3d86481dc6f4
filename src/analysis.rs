//! Remote image analysis
//!
//! Two single-shot exchanges with the analysis backend: describe an image, and
//! turn a description into social media posts. No retries, no partial results.

mod error;
mod http;

pub use error::AnalysisError;
pub use http::HttpAnalysisService;

use crate::i18n::{resolve, Language, MessageId};
use crate::transcript::ImageBlob;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of one remote call, consumed once by the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Described(String),
    Failed(String),
}

impl From<Result<String, AnalysisError>> for AnalysisResult {
    fn from(outcome: Result<String, AnalysisError>) -> Self {
        match outcome {
            Ok(text) => AnalysisResult::Described(text),
            Err(e) => AnalysisResult::Failed(e.message),
        }
    }
}

/// Backend that describes images and writes social media posts
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Describe an uploaded image, using `language` as a locale hint
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError>;

    /// Generate social media copy from a previously produced description
    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError>;
}

#[async_trait]
impl<T: AnalysisService + ?Sized> AnalysisService for Arc<T> {
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError> {
        (**self).describe_image(image, language).await
    }

    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError> {
        (**self).generate_posts(description, language).await
    }
}

/// Logging wrapper for analysis services
pub struct LoggingService {
    inner: Arc<dyn AnalysisService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn AnalysisService>) -> Self {
        Self { inner }
    }

    fn log_outcome(
        operation: &'static str,
        failure_label: MessageId,
        language: Language,
        started: std::time::Instant,
        result: &Result<String, AnalysisError>,
    ) {
        let duration = started.elapsed();
        match result {
            Ok(text) => {
                tracing::info!(
                    operation,
                    language = %language,
                    duration_ms = %duration.as_millis(),
                    response_len = text.len(),
                    "Analysis request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    language = %language,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    error = %e.message,
                    "{}",
                    resolve(failure_label, Language::En, None)
                );
            }
        }
    }
}

#[async_trait]
impl AnalysisService for LoggingService {
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let started = std::time::Instant::now();
        let result = self.inner.describe_image(image, language).await;
        Self::log_outcome(
            "describe_image",
            MessageId::ImageApiError,
            language,
            started,
            &result,
        );
        result
    }

    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let started = std::time::Instant::now();
        let result = self.inner.generate_posts(description, language).await;
        Self::log_outcome(
            "generate_posts",
            MessageId::ApiError,
            language,
            started,
            &result,
        );
        result
    }
}
