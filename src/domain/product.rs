//! Canonical product records and grouped-product entities
//!
//! Raw listings arrive from the search and category services with
//! inconsistent field names (`productId` vs `id`, `productPrice` vs `price`,
//! `isRocket` vs `rocketShipping`). All of that variance is absorbed here,
//! in one normalization step at ingestion; the rest of the crate only ever
//! sees [`ProductRecord`].

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Wire shape of a single listing as returned by the search/category APIs.
///
/// Serde aliases cover both naming schemes the services are known to use.
/// Every field is optional; validation happens in [`ProductRecord::from_raw`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default, alias = "id")]
    pub product_id: Option<i64>,
    #[serde(default, alias = "title")]
    pub product_name: Option<String>,
    /// 가격은 숫자 또는 문자열로 내려온다
    #[serde(default, alias = "price")]
    pub product_price: Option<serde_json::Value>,
    #[serde(default, alias = "image")]
    pub product_image: Option<String>,
    #[serde(default, alias = "url")]
    pub product_url: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, alias = "rocketShipping")]
    pub is_rocket: Option<bool>,
    #[serde(default)]
    pub is_free_shipping: Option<bool>,
}

/// Canonical unit of a single listing after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: Option<i64>,
    pub name: String,
    /// Price in KRW (smallest currency unit). Listings without a price keep 0.
    pub price: u64,
    pub image_url: String,
    pub url: String,
    pub category_name: Option<String>,
    pub is_rocket_delivery: bool,
    pub is_free_shipping: bool,
}

impl ProductRecord {
    /// Normalize one raw listing into the canonical record.
    ///
    /// Returns `None` (with a logged warning) for listings that cannot be
    /// displayed at all: no name, or a negative/unparseable price value.
    /// A missing price is valid and normalizes to 0 — keyword and link
    /// search results are not price-annotated consistently.
    pub fn from_raw(raw: &RawListing) -> Option<Self> {
        let name = match raw.product_name.as_deref() {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => {
                warn!("상품명이 없는 항목을 건너뜁니다: {:?}", raw.product_url);
                return None;
            }
        };

        let price = match raw.product_price.as_ref() {
            None => 0,
            Some(value) => match parse_price(value) {
                Some(p) => p,
                None => {
                    warn!("가격을 해석할 수 없는 항목을 건너뜁니다: {} ({:?})", name, value);
                    return None;
                }
            },
        };

        Some(Self {
            product_id: raw.product_id,
            name,
            price,
            image_url: raw.product_image.clone().unwrap_or_default(),
            url: raw.product_url.clone().unwrap_or_default(),
            category_name: raw.category_name.clone(),
            // 레거시 rocketShipping 플래그는 alias로 이미 병합되어 있음
            is_rocket_delivery: raw.is_rocket.unwrap_or(false),
            is_free_shipping: raw.is_free_shipping.unwrap_or(false),
        })
    }

    /// Identity key for grouping. Listings without a product id fall back to
    /// a URL-derived key so they form stable singleton groups.
    pub fn group_key(&self) -> GroupKey {
        match self.product_id {
            Some(id) => GroupKey::Id(id),
            None => {
                let basis = if self.url.is_empty() { &self.name } else { &self.url };
                GroupKey::UrlHash(blake3::hash(basis.as_bytes()).to_hex().to_string())
            }
        }
    }
}

/// Accepts integer, float and numeric-string prices; rejects negatives.
fn parse_price(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                u64::try_from(i).ok()
            } else {
                n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)
            }
        }
        serde_json::Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
            cleaned.parse::<i64>().ok().and_then(|i| u64::try_from(i).ok())
        }
        serde_json::Value::Null => Some(0),
        _ => None,
    }
}

/// Parse a raw API response body into listings.
///
/// Non-array and malformed input coerces to an empty list with a warning
/// rather than propagating a fault into rendering paths.
pub fn parse_listing_array(body: &serde_json::Value) -> Vec<RawListing> {
    let Some(items) = body.as_array() else {
        warn!("목록 응답이 배열이 아닙니다. 빈 결과로 처리합니다");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<RawListing>(item.clone()) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("목록 항목 파싱 실패 (건너뜀): {}", e);
                None
            }
        })
        .collect()
}

/// Normalize a batch of raw listings, dropping the malformed ones.
pub fn normalize_listings(raw: &[RawListing]) -> Vec<ProductRecord> {
    raw.iter().filter_map(ProductRecord::from_raw).collect()
}

/// Grouping identity. Multiple sale options of the same product share a
/// `productId`; listings without one are keyed by a hash of their URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Id(i64),
    UrlHash(String),
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Id(id) => write!(f, "{id}"),
            GroupKey::UrlHash(hash) => write!(f, "u{hash}"),
        }
    }
}

/// Min/max price across the variants of a grouped product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

/// One purchasable listing inside a grouped product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// `vendorItemId` query parameter of the listing URL, empty when absent.
    pub vendor_item_id: String,
    /// `itemId` query parameter of the listing URL, empty when absent.
    pub item_id: String,
    /// Signed difference against the group's minimum price.
    pub price_difference: i64,
    pub record: ProductRecord,
}

impl ProductVariant {
    /// Extract the variant-identifying query parameters from a listing URL.
    pub fn extract_variant_params(url: &str) -> (String, String) {
        let Ok(parsed) = Url::parse(url) else {
            return (String::new(), String::new());
        };
        let mut vendor_item_id = String::new();
        let mut item_id = String::new();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "vendorItemId" => vendor_item_id = value.into_owned(),
                "itemId" => item_id = value.into_owned(),
                _ => {}
            }
        }
        (vendor_item_id, item_id)
    }
}

/// Deduplicated, display-ready product entity.
///
/// Built fresh on every search/category response; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedProduct {
    pub key: GroupKey,
    /// The cheapest variant's record — the canonical representative.
    pub main_item: ProductRecord,
    /// Ascending by price; ties keep original input order.
    pub variants: Vec<ProductVariant>,
    pub price_range: PriceRange,
    pub variant_count: usize,
}

/// Deep-link conversion result as returned by the deep-link service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLinkResult {
    pub original_url: String,
    #[serde(default)]
    pub shorten_url: String,
    #[serde(default)]
    pub landing_url: String,
}

impl DeepLinkResult {
    /// The most specific URL available for this conversion.
    pub fn best_url(&self) -> &str {
        if !self.shorten_url.is_empty() {
            &self.shorten_url
        } else if !self.landing_url.is_empty() {
            &self.landing_url
        } else {
            &self.original_url
        }
    }
}
