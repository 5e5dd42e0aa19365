//! HTTP implementations of the search, category and deep-link contracts
//!
//! These are thin: build the request body, POST, and hand the raw payload
//! to the domain normalization step. Field-name variance is not resolved
//! here — [`crate::domain::product::RawListing`] owns that.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::json;

use crate::domain::product::{DeepLinkResult, RawListing, parse_listing_array};
use crate::domain::services::{DeepLinkService, ProductSearchService};
use crate::infrastructure::config::ServiceEndpoints;
use crate::infrastructure::http_client::HttpClient;

/// Client for the listing-producing services.
pub struct HttpListingClient {
    http: Arc<HttpClient>,
    endpoints: ServiceEndpoints,
}

impl HttpListingClient {
    pub fn new(http: Arc<HttpClient>, endpoints: ServiceEndpoints) -> Self {
        Self { http, endpoints }
    }

    async fn post_listing_request(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<Vec<RawListing>> {
        let response = self.http.post_json(url, &body).await?;
        let status = response.status();
        if !status.is_success() {
            bail!("목록 API 오류 (status {}): {}", status.as_u16(), url);
        }
        let payload: serde_json::Value =
            response.json().await.with_context(|| format!("목록 응답 파싱 실패: {url}"))?;
        Ok(parse_listing_array(&payload))
    }
}

#[async_trait]
impl ProductSearchService for HttpListingClient {
    async fn search_keyword(&self, keyword: &str) -> Result<Vec<RawListing>> {
        if keyword.trim().is_empty() {
            bail!("검색어가 비어 있습니다");
        }
        self.post_listing_request(&self.endpoints.search_url, json!({ "keyword": keyword }))
            .await
    }

    async fn browse_category(
        &self,
        category_id: &str,
        limit: u32,
        image_size: &str,
    ) -> Result<Vec<RawListing>> {
        if category_id.trim().is_empty() {
            bail!("카테고리가 비어 있습니다");
        }
        self.post_listing_request(
            &self.endpoints.category_url,
            json!({ "categoryId": category_id, "limit": limit, "imageSize": image_size }),
        )
        .await
    }
}

#[async_trait]
impl DeepLinkService for HttpListingClient {
    async fn convert_links(&self, urls: &[String]) -> Result<Vec<DeepLinkResult>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .http
            .post_json(&self.endpoints.deeplink_url, &json!({ "urls": urls }))
            .await?;
        let status = response.status();
        if !status.is_success() {
            bail!("딥링크 변환 API 오류 (status {})", status.as_u16());
        }
        let results: Vec<DeepLinkResult> =
            response.json().await.context("딥링크 응답 파싱 실패")?;
        Ok(results)
    }
}
