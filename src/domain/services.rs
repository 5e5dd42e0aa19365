//! Service contracts for the black-box external collaborators
//!
//! The four remote services (keyword search, category browse, deep-link
//! conversion, per-item research) and the clipboard are consumed only
//! through these traits. Infrastructure provides the reqwest-backed
//! implementations; tests provide mocks.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::product::{DeepLinkResult, RawListing};
use crate::domain::research::{ResearchData, ResearchError, ResearchRequest};

/// Keyword and category product search.
#[async_trait]
pub trait ProductSearchService: Send + Sync {
    /// `POST {keyword}` → raw listings (shape varies; normalized downstream).
    async fn search_keyword(&self, keyword: &str) -> anyhow::Result<Vec<RawListing>>;

    /// `POST {categoryId, limit, imageSize}` → raw listings.
    async fn browse_category(
        &self,
        category_id: &str,
        limit: u32,
        image_size: &str,
    ) -> anyhow::Result<Vec<RawListing>>;
}

/// Tracked deep-link conversion.
#[async_trait]
pub trait DeepLinkService: Send + Sync {
    /// `POST {urls}` → one conversion result per input URL.
    async fn convert_links(&self, urls: &[String]) -> anyhow::Result<Vec<DeepLinkResult>>;
}

/// Per-item AI research generation.
#[async_trait]
pub trait ResearchService: Send + Sync {
    /// One research call for one item. Failures are returned, not thrown
    /// across sibling items — the engine contains them per item.
    async fn research_item(
        &self,
        request: &ResearchRequest,
        cancellation: &CancellationToken,
    ) -> Result<ResearchData, ResearchError>;
}

/// Clipboard seam for the copy-links action. The OS clipboard belongs to
/// the UI shell; the crate ships an in-memory implementation for headless
/// use and tests.
#[async_trait]
pub trait ClipboardPort: Send + Sync {
    async fn write_text(&self, text: &str) -> anyhow::Result<()>;
}
