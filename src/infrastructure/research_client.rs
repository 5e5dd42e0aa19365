//! HTTP implementation of the per-item research contract
//!
//! One POST per item. Failures come back as typed [`ResearchError`]s so
//! the engine can contain them per item: an API-reported error body, a
//! transport drop and a malformed success body all map into the same
//! failure taxonomy.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::domain::research::{ResearchData, ResearchError, ResearchRequest, ResearchResponse};
use crate::domain::services::ResearchService;
use crate::infrastructure::http_client::HttpClient;

/// Error body shape the research service returns on non-2xx.
#[derive(Debug, Deserialize)]
struct ResearchErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Client for the research generation service.
pub struct HttpResearchClient {
    http: Arc<HttpClient>,
    research_url: String,
}

impl HttpResearchClient {
    pub fn new(http: Arc<HttpClient>, research_url: String) -> Self {
        Self { http, research_url }
    }
}

#[async_trait]
impl ResearchService for HttpResearchClient {
    async fn research_item(
        &self,
        request: &ResearchRequest,
        cancellation: &CancellationToken,
    ) -> Result<ResearchData, ResearchError> {
        if cancellation.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }

        let body = serde_json::to_value(request)
            .map_err(|e| ResearchError::Parse(e.to_string()))?;

        let response = self
            .http
            .post_json_with_cancellation(&self.research_url, &body, cancellation)
            .await
            .map_err(|e| {
                if cancellation.is_cancelled() {
                    ResearchError::Cancelled
                } else {
                    ResearchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // 오류 본문은 {error|details} 형태이거나 비어 있을 수 있다
            let message = match response.json::<ResearchErrorBody>().await {
                Ok(parsed) => parsed
                    .error
                    .or(parsed.details)
                    .unwrap_or_else(|| "알 수 없는 오류".to_string()),
                Err(_) => "알 수 없는 오류".to_string(),
            };
            return Err(ResearchError::Api { status: status.as_u16(), message });
        }

        let parsed: ResearchResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::Parse(e.to_string()))?;
        Ok(parsed.research_data)
    }
}
