//! HTTP client for the analysis backend

use super::{AnalysisError, AnalysisService};
use crate::i18n::Language;
use crate::transcript::ImageBlob;
use async_trait::async_trait;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DESCRIBE_PATH: &str = "/image-description";
const POSTS_PATH: &str = "/social-posts";

/// Analysis backend reached over HTTP
pub struct HttpAnalysisService {
    client: Client,
    base_url: String,
}

impl HttpAnalysisService {
    /// No request timeout is set: a call lasts until the backend answers or
    /// the owning session cancels it.
    pub fn new(base_url: &str) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AnalysisError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT_LANGUAGE, language.code())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::network(format!("Connection failed: {e}"))
                } else {
                    AnalysisError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AnalysisError::status(status.as_u16(), &body));
        }

        parse_response(&body)
    }
}

#[derive(Serialize)]
struct DescribeRequest<'a> {
    image: &'a [u8],
}

#[derive(Serialize)]
struct PostsRequest<'a> {
    description: &'a str,
}

#[derive(Deserialize)]
struct AnalysisResponse {
    response: String,
}

fn parse_response(body: &str) -> Result<String, AnalysisError> {
    let parsed: AnalysisResponse = serde_json::from_str(body)
        .map_err(|e| AnalysisError::malformed(format!("Failed to parse response: {e}")))?;

    if parsed.response.trim().is_empty() {
        return Err(AnalysisError::malformed("Empty response field"));
    }

    Ok(parsed.response)
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let request = DescribeRequest {
            image: image.bytes(),
        };
        self.post(DESCRIBE_PATH, &request, language).await
    }

    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let request = PostsRequest { description };
        self.post(POSTS_PATH, &request, language).await
    }
}
