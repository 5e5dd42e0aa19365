//! Research workflow entities
//!
//! Input summaries, the per-item research request/response wire shapes,
//! the normalized [`ResearchPack`] output, contained per-item failures and
//! the consolidated [`ResearchHandoff`] passed to the results view.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::domain::product::ProductRecord;

/// Compact summary of one selected product, carried through a research run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchItemSummary {
    pub item_id: String,
    pub name: String,
    pub price: u64,
    pub url: String,
    pub is_rocket_delivery: bool,
}

impl ResearchItemSummary {
    pub fn from_record(record: &ProductRecord) -> Self {
        Self {
            item_id: record.group_key().to_string(),
            name: record.name.clone(),
            price: record.price,
            url: record.url.clone(),
            is_rocket_delivery: record.is_rocket_delivery,
        }
    }
}

/// Wire request for one per-item research call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub item_name: String,
    pub project_id: Uuid,
    pub item_id: String,
    pub product_data: ProductRecord,
}

/// Raw payload of a successful research response.
///
/// Every field is defaulted — the service occasionally omits sections and
/// a sparse payload is still a success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchData {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub popular_brands: Vec<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub cautions: Vec<String>,
}

/// Envelope of the research service response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub research_data: ResearchData,
}

/// Normalized output of one successful per-item research call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPack {
    pub item_id: String,
    pub title: String,
    #[serde(rename = "priceKRW")]
    pub price_krw: u64,
    pub is_rocket_delivery: bool,
    pub features: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub keywords: Vec<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub slug: String,
}

impl ResearchPack {
    /// Build a pack from the source record and the raw research payload.
    ///
    /// SEO fields the service does not provide are synthesized here: meta
    /// title from the product name, meta description from the overview,
    /// slug from the slugified name, keywords from popular brands plus the
    /// category.
    pub fn build(item: &ResearchItemSummary, record: &ProductRecord, data: ResearchData) -> Self {
        let mut keywords = data.popular_brands;
        if let Some(category) = record.category_name.as_deref() {
            if !category.is_empty() && !keywords.iter().any(|k| k == category) {
                keywords.push(category.to_string());
            }
        }

        Self {
            item_id: item.item_id.clone(),
            title: record.name.clone(),
            price_krw: record.price,
            is_rocket_delivery: record.is_rocket_delivery,
            features: data.features,
            pros: data.benefits,
            cons: data.cautions,
            keywords,
            meta_title: format!("{} 추천 및 구매 가이드", record.name),
            meta_description: truncate_chars(&data.overview, 160),
            slug: slugify(&record.name),
        }
    }
}

/// One contained per-item failure. Never aborts sibling items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchFailure {
    pub item: ResearchItemSummary,
    pub error: String,
}

/// Research workflow errors.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("선택된 상품이 없습니다")]
    EmptySelection,
    #[error("리서치 요청 한도를 초과했습니다 (최대 {max}개, 요청 {received}개)")]
    TooManyItems { max: usize, received: usize },
    #[error("리서치 API 오류 (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("네트워크 오류: {0}")]
    Transport(String),
    #[error("응답 파싱 실패: {0}")]
    Parse(String),
    #[error("작업이 취소되었습니다")]
    Cancelled,
}

/// Consolidated result of a finished run, handed off to the results view.
///
/// Failed items are reported through the run summary and events, never
/// through the handoff payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchHandoff {
    pub project_id: Uuid,
    pub completed: Vec<ResearchPack>,
}

impl ResearchHandoff {
    /// Navigation target for the results view, with the completed packs
    /// serialized into an encoded query parameter.
    ///
    /// URL length practically bounds run size; oversized payloads are
    /// logged, not rejected — the downstream consumer decides.
    pub fn results_url(&self, base: &str) -> Result<Url, ResearchError> {
        let payload = serde_json::to_string(&self.completed)
            .map_err(|e| ResearchError::Parse(e.to_string()))?;
        let url = Url::parse_with_params(
            base,
            &[("projectId", self.project_id.to_string()), ("results", payload)],
        )
        .map_err(|e| ResearchError::Parse(e.to_string()))?;

        if url.as_str().len() > 8000 {
            warn!(
                "결과 URL이 {}자로 매우 깁니다. 일부 브라우저에서 잘릴 수 있습니다",
                url.as_str().len()
            );
        }
        Ok(url)
    }
}

/// Lowercased, hyphen-separated slug keeping unicode alphanumerics.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_hyphen = true;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            product_id: Some(1001),
            name: "무선 블루투스 이어폰".into(),
            price: 32900,
            image_url: String::new(),
            url: "https://shop.example.com/p/1001".into(),
            category_name: Some("이어폰".into()),
            is_rocket_delivery: true,
            is_free_shipping: false,
        }
    }

    #[test]
    fn pack_maps_and_synthesizes_fields() {
        let rec = record();
        let item = ResearchItemSummary::from_record(&rec);
        let data = ResearchData {
            features: vec!["블루투스 5.3".into()],
            benefits: vec!["가성비".into()],
            popular_brands: vec!["삼성".into(), "애플".into()],
            overview: "간단한 개요".into(),
            cautions: vec![],
        };
        let pack = ResearchPack::build(&item, &rec, data);

        assert_eq!(pack.item_id, "1001");
        assert_eq!(pack.price_krw, 32900);
        assert_eq!(pack.pros, vec!["가성비"]);
        assert!(pack.cons.is_empty());
        // 카테고리가 키워드에 합쳐진다
        assert_eq!(pack.keywords, vec!["삼성", "애플", "이어폰"]);
        assert_eq!(pack.meta_title, "무선 블루투스 이어폰 추천 및 구매 가이드");
        assert_eq!(pack.meta_description, "간단한 개요");
        assert_eq!(pack.slug, "무선-블루투스-이어폰");
    }

    #[test]
    fn sparse_research_payload_still_builds() {
        let rec = record();
        let item = ResearchItemSummary::from_record(&rec);
        let pack = ResearchPack::build(&item, &rec, ResearchData::default());
        assert!(pack.features.is_empty());
        assert_eq!(pack.keywords, vec!["이어폰"]);
    }

    #[test]
    fn research_response_tolerates_missing_sections() {
        let parsed: ResearchResponse = serde_json::from_value(serde_json::json!({
            "researchData": {"features": ["f1"], "overview": "o"}
        }))
        .unwrap();
        assert_eq!(parsed.research_data.features, vec!["f1"]);
        assert!(parsed.research_data.benefits.is_empty());
    }

    #[test]
    fn slugify_handles_spacing_and_symbols() {
        assert_eq!(slugify("무선 이어폰 (2세대)"), "무선-이어폰-2세대");
        assert_eq!(slugify("  USB-C  Hub!! "), "usb-c-hub");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn handoff_url_round_trips_project_id_and_results() {
        let handoff = ResearchHandoff {
            project_id: Uuid::new_v4(),
            completed: vec![],
        };
        let url = handoff.results_url("https://app.example.com/results").unwrap();
        let params: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(params[0].0, "projectId");
        assert_eq!(params[0].1, handoff.project_id.to_string());
        assert_eq!(params[1].0, "results");
        let decoded: Vec<ResearchPack> = serde_json::from_str(&params[1].1).unwrap();
        assert!(decoded.is_empty());
    }
}
