//! Research engine sanity runner to verify batch sequencing, progress events
//! and partial-failure containment without touching the network.
//!
//! This binary bootstraps the engine with an in-process research stub,
//! subscribes to the event stream, and executes one run over a small fixed
//! selection. Set LP_FAIL_ITEM=<item_id> to force a deterministic per-item
//! failure and observe the degraded-progress path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use linkpick::application::EventEmitter;
use linkpick::domain::job_manager::JobManager;
use linkpick::domain::product::ProductRecord;
use linkpick::domain::research::{ResearchData, ResearchError, ResearchRequest};
use linkpick::domain::services::ResearchService;
use linkpick::infrastructure::config::AppConfig;
use linkpick::infrastructure::{BatchResearchEngine, ResearchEngineConfig};

/// Deterministic in-process stand-in for the research API.
struct StubResearchService {
    fail_item_id: Option<String>,
}

#[async_trait]
impl ResearchService for StubResearchService {
    async fn research_item(
        &self,
        request: &ResearchRequest,
        _cancellation: &CancellationToken,
    ) -> Result<ResearchData, ResearchError> {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        if self.fail_item_id.as_deref() == Some(request.item_id.as_str()) {
            return Err(ResearchError::Api { status: 500, message: "강제 실패 (LP_FAIL_ITEM)".into() });
        }
        Ok(ResearchData {
            features: vec![format!("{}의 주요 특징", request.item_name)],
            benefits: vec!["훌륭한 가성비".into()],
            popular_brands: vec!["브랜드A".into(), "브랜드B".into()],
            overview: format!("{} 개요", request.item_name),
            cautions: vec![],
        })
    }
}

fn sample_selection() -> Vec<ProductRecord> {
    (1..=5i64)
        .map(|id| ProductRecord {
            product_id: Some(id),
            name: format!("샘플 상품 {id}"),
            price: 10_000 * id as u64,
            image_url: format!("https://img.example.com/{id}.jpg"),
            url: format!("https://shop.example.com/p/{id}?vendorItemId=v{id}&itemId=i{id}"),
            category_name: Some("샘플".into()),
            is_rocket_delivery: id % 2 == 0,
            is_free_shipping: false,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = linkpick::infrastructure::logging::init_logging();

    info!("🚀 research engine sanity runner starting");
    info!("LP_FAIL_ITEM={:?}", std::env::var("LP_FAIL_ITEM").ok());

    let config = match AppConfig::load().await {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("설정 로드 실패, 기본값 사용: {}", e);
            AppConfig::default()
        }
    };

    let emitter = EventEmitter::new();
    let mut event_rx = emitter.subscribe();
    tokio::spawn(async move {
        while let Ok(evt) = event_rx.recv().await {
            tracing::info!("[event] {:?}", evt);
        }
    });

    let research = Arc::new(StubResearchService {
        fail_item_id: std::env::var("LP_FAIL_ITEM").ok(),
    });
    let job_manager = Arc::new(JobManager::new());
    let engine = BatchResearchEngine::new(
        research,
        Arc::clone(&job_manager),
        emitter.clone(),
        ResearchEngineConfig {
            batch_delay_ms: 100,
            ..config.research_engine_config()
        },
    );

    let selection = sample_selection();
    info!("📦 {}개 상품으로 리서치 실행", selection.len());

    let handoff = engine.execute(selection, CancellationToken::new()).await?;
    let results_url = handoff.results_url(&config.advanced.endpoints.results_base_url)?;

    info!("✅ 완료: {}개 리서치 팩", handoff.completed.len());
    info!("🔗 결과 URL({}자): {}...", results_url.as_str().len(),
        &results_url.as_str()[..results_url.as_str().len().min(120)]);

    let stats = job_manager.statistics().await;
    info!("📊 작업 통계: {:?}", stats.jobs_by_status);

    info!("🏁 sanity run finished");
    Ok(())
}
