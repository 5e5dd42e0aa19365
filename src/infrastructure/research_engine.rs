//! 배치 리서치 엔진
//!
//! Drives the AI research workflow over a selection of products: fixed-size
//! batches processed sequentially, items within a batch dispatched
//! concurrently, per-item failures contained, progress emitted after every
//! settled batch, and a consolidated handoff produced once every batch has
//! been processed — regardless of how many items failed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::events::EventEmitter;
use crate::domain::events::{NoticeLevel, ResearchProgress, ResearchStage, RunSummary};
use crate::domain::job_manager::JobManager;
use crate::domain::product::ProductRecord;
use crate::domain::research::{
    ResearchError, ResearchFailure, ResearchHandoff, ResearchItemSummary, ResearchPack,
    ResearchRequest,
};
use crate::domain::services::ResearchService;

/// Research engine settings.
#[derive(Debug, Clone)]
pub struct ResearchEngineConfig {
    /// Items dispatched concurrently per batch. Batches run sequentially,
    /// so this is also the peak number of in-flight research calls.
    pub batch_size: usize,
    /// Delay between batches in milliseconds.
    pub batch_delay_ms: u64,
    /// Upper bound on the selection size for a single run.
    pub max_items_per_run: usize,
}

impl Default for ResearchEngineConfig {
    fn default() -> Self {
        Self { batch_size: 2, batch_delay_ms: 250, max_items_per_run: 20 }
    }
}

/// Batch research orchestrator.
pub struct BatchResearchEngine {
    research: Arc<dyn ResearchService>,
    job_manager: Arc<JobManager>,
    emitter: EventEmitter,
    config: ResearchEngineConfig,
}

struct BatchOutcome {
    completed: Vec<ResearchPack>,
    failures: Vec<ResearchFailure>,
}

impl BatchResearchEngine {
    pub fn new(
        research: Arc<dyn ResearchService>,
        job_manager: Arc<JobManager>,
        emitter: EventEmitter,
        config: ResearchEngineConfig,
    ) -> Self {
        Self { research, job_manager, emitter, config }
    }

    /// Run the full batch sequence over the selected products.
    ///
    /// Rejections (empty selection, oversized selection) happen before any
    /// network call. Once a run starts it always reaches finalization: the
    /// job leaves `Running`, the modal-close event fires and a terminal
    /// notice is emitted on every exit path.
    pub async fn execute(
        &self,
        selected: Vec<ProductRecord>,
        cancellation: CancellationToken,
    ) -> Result<ResearchHandoff, ResearchError> {
        if selected.is_empty() {
            self.emitter.emit_notice(NoticeLevel::Warning, "선택된 상품이 없습니다").await;
            return Err(ResearchError::EmptySelection);
        }
        if selected.len() > self.config.max_items_per_run {
            let error = ResearchError::TooManyItems {
                max: self.config.max_items_per_run,
                received: selected.len(),
            };
            self.emitter.emit_notice(NoticeLevel::Warning, error.to_string()).await;
            return Err(error);
        }

        let project_id = Uuid::new_v4();
        let batch_size = self.config.batch_size.max(1);
        let total = selected.len();
        let total_batches = total.div_ceil(batch_size);

        info!(
            "리서치 실행 시작: project={} ({}개 상품, {}개 배치)",
            project_id, total, total_batches
        );
        self.job_manager.start_job(project_id, total as u32, total_batches as u32).await;

        let started = Instant::now();
        let result = self.run_batches(project_id, &selected, batch_size, &cancellation).await;
        self.finalize(project_id, total, started.elapsed(), result).await
    }

    /// Sequential batch loop. Per-item failures never escape this function;
    /// an `Err` here means a fault outside per-item containment.
    async fn run_batches(
        &self,
        project_id: Uuid,
        selected: &[ProductRecord],
        batch_size: usize,
        cancellation: &CancellationToken,
    ) -> Result<BatchOutcome, ResearchError> {
        let total = selected.len();
        let total_batches = total.div_ceil(batch_size);
        let mut completed: Vec<ResearchPack> = Vec::new();
        let mut failures: Vec<ResearchFailure> = Vec::new();
        let mut processed = 0usize;

        for (batch_idx, batch) in selected.chunks(batch_size).enumerate() {
            // 취소는 배치 경계에서만 확인 - 진행 중 배치는 끝까지 수행
            if cancellation.is_cancelled() {
                warn!("리서치 실행 취소됨: project={} ({}/{} 처리)", project_id, processed, total);
                self.emitter
                    .emit_notice(NoticeLevel::Warning, "리서치가 취소되었습니다")
                    .await;
                break;
            }

            if batch_idx > 0 && self.config.batch_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }

            let tasks: Vec<_> = batch
                .iter()
                .map(|record| {
                    let research = Arc::clone(&self.research);
                    let record = record.clone();
                    let token = cancellation.clone();
                    tokio::spawn(async move {
                        let summary = ResearchItemSummary::from_record(&record);
                        let request = ResearchRequest {
                            item_name: record.name.clone(),
                            project_id,
                            item_id: summary.item_id.clone(),
                            product_data: record.clone(),
                        };
                        match research.research_item(&request, &token).await {
                            Ok(data) => Ok(ResearchPack::build(&summary, &record, data)),
                            Err(e) => Err(ResearchFailure { item: summary, error: e.to_string() }),
                        }
                    })
                })
                .collect();

            // join_all은 입력 순서를 보존한다 - 핸드오프 순서 결정성의 근거
            let mut batch_failed = 0u32;
            for (task_idx, joined) in join_all(tasks).await.into_iter().enumerate() {
                match joined {
                    Ok(Ok(pack)) => completed.push(pack),
                    Ok(Err(failure)) => {
                        warn!(
                            "상품 리서치 실패: project={} item={} ({})",
                            project_id, failure.item.item_id, failure.error
                        );
                        self.job_manager
                            .add_error(project_id, format!("{}: {}", failure.item.item_id, failure.error))
                            .await;
                        batch_failed += 1;
                        failures.push(failure);
                    }
                    Err(join_error) => {
                        // 패닉한 태스크도 해당 항목의 실패로 격리한다
                        let record = &batch[task_idx];
                        let failure = ResearchFailure {
                            item: ResearchItemSummary::from_record(record),
                            error: format!("작업 비정상 종료: {join_error}"),
                        };
                        self.job_manager.add_error(project_id, failure.error.clone()).await;
                        batch_failed += 1;
                        failures.push(failure);
                    }
                }
            }

            processed += batch.len();
            self.job_manager
                .update_progress(
                    project_id,
                    processed as u32,
                    completed.len() as u32,
                    failures.len() as u32,
                    (batch_idx + 1) as u32,
                )
                .await;

            self.emitter
                .emit_progress(ResearchProgress {
                    project_id,
                    current: processed as u32,
                    total: total as u32,
                    current_batch: (batch_idx + 1) as u32,
                    total_batches: total_batches as u32,
                    succeeded: completed.len() as u32,
                    failed: failures.len() as u32,
                    stage: ResearchStage::Running,
                    message: format!("{processed}/{total} 상품 리서치 완료"),
                    timestamp: chrono::Utc::now(),
                })
                .await;

            if batch_failed > 0 {
                self.emitter
                    .emit_notice(NoticeLevel::Warning, "일부 상품의 리서치에 실패했습니다")
                    .await;
            }
        }

        Ok(BatchOutcome { completed, failures })
    }

    /// Terminal phase, reached on every path once a run has started.
    async fn finalize(
        &self,
        project_id: Uuid,
        total: usize,
        elapsed: Duration,
        result: Result<BatchOutcome, ResearchError>,
    ) -> Result<ResearchHandoff, ResearchError> {
        match result {
            Ok(outcome) => {
                self.job_manager.begin_finalize(project_id).await;
                self.emitter.emit_modal_closed().await;

                let summary = RunSummary {
                    project_id,
                    total_items: total as u32,
                    succeeded: outcome.completed.len() as u32,
                    failed: outcome.failures.len() as u32,
                    duration_ms: elapsed.as_millis() as u64,
                    completed: outcome.completed.clone(),
                    failures: outcome.failures.clone(),
                };

                let notice = if summary.is_total_failure() {
                    (NoticeLevel::Error, "상품 리서치에 모두 실패했습니다".to_string())
                } else if summary.is_partial_failure() {
                    (
                        NoticeLevel::Warning,
                        format!(
                            "상품 리서치가 완료되었습니다 (성공 {}건, 실패 {}건)",
                            summary.succeeded, summary.failed
                        ),
                    )
                } else {
                    (NoticeLevel::Info, "상품 리서치가 완료되었습니다".to_string())
                };
                self.emitter.emit_notice(notice.0, notice.1).await;
                self.emitter.emit_completed(summary).await;
                self.job_manager.complete_job(project_id).await;

                info!(
                    "리서치 실행 종료: project={} ({}개 성공, {}개 실패, {:?})",
                    project_id,
                    outcome.completed.len(),
                    outcome.failures.len(),
                    elapsed
                );
                // 실패 항목은 핸드오프에 포함하지 않는다
                Ok(ResearchHandoff { project_id, completed: outcome.completed })
            }
            Err(error) => {
                // 격리 바깥의 예외: 로딩 상태가 Running으로 남지 않도록 정리
                self.job_manager.fail_job(project_id, error.to_string()).await;
                self.emitter.emit_modal_closed().await;
                self.emitter.emit_notice(NoticeLevel::Error, error.to_string()).await;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::job_manager::JobStatus;
    use crate::domain::research::ResearchData;

    struct MockResearchService {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        fail_item_ids: HashSet<String>,
        cancel_after_first: Option<CancellationToken>,
    }

    impl MockResearchService {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                fail_item_ids: HashSet::new(),
                cancel_after_first: None,
            }
        }

        fn failing_on(ids: &[&str]) -> Self {
            Self {
                fail_item_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl ResearchService for MockResearchService {
        async fn research_item(
            &self,
            request: &ResearchRequest,
            _cancellation: &CancellationToken,
        ) -> Result<ResearchData, ResearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            // 배치 내 동시성 측정을 위해 잠시 대기
            sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }

            if self.fail_item_ids.contains(&request.item_id) {
                return Err(ResearchError::Api { status: 500, message: "생성 실패".into() });
            }
            Ok(ResearchData {
                features: vec![format!("{} 특징", request.item_name)],
                benefits: vec!["장점".into()],
                popular_brands: vec![],
                overview: "개요".into(),
                cautions: vec![],
            })
        }
    }

    fn records(n: usize) -> Vec<ProductRecord> {
        (1..=n as i64)
            .map(|id| ProductRecord {
                product_id: Some(id),
                name: format!("상품 {id}"),
                price: 1000 * id as u64,
                image_url: String::new(),
                url: format!("https://shop.example.com/p/{id}"),
                category_name: None,
                is_rocket_delivery: false,
                is_free_shipping: false,
            })
            .collect()
    }

    fn engine(
        service: Arc<MockResearchService>,
        config: ResearchEngineConfig,
    ) -> (BatchResearchEngine, Arc<JobManager>, EventEmitter) {
        let job_manager = Arc::new(JobManager::new());
        let emitter = EventEmitter::new();
        let engine = BatchResearchEngine::new(
            service,
            Arc::clone(&job_manager),
            emitter.clone(),
            config,
        );
        (engine, job_manager, emitter)
    }

    #[tokio::test]
    async fn dispatches_each_item_exactly_once_across_batches() {
        let service = Arc::new(MockResearchService::new());
        let config = ResearchEngineConfig { batch_delay_ms: 0, ..Default::default() };
        let (engine, _, _) = engine(Arc::clone(&service), config);

        let handoff = engine.execute(records(5), CancellationToken::new()).await.unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 5);
        assert_eq!(handoff.completed.len(), 5);
        // 배치 크기 2를 넘는 동시 요청은 없어야 한다
        assert!(service.peak_in_flight.load(Ordering::SeqCst) <= 2);
        // 핸드오프는 입력 순서를 보존한다
        let ids: Vec<&str> = handoff.completed.iter().map(|p| p.item_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn contains_partial_failure_within_a_batch() {
        let service = Arc::new(MockResearchService::failing_on(&["2"]));
        let config = ResearchEngineConfig { batch_delay_ms: 0, ..Default::default() };
        let (engine, job_manager, emitter) = engine(Arc::clone(&service), config);
        let mut rx = emitter.subscribe();

        let handoff = engine.execute(records(2), CancellationToken::new()).await.unwrap();

        assert_eq!(handoff.completed.len(), 1);
        assert_eq!(handoff.completed[0].item_id, "1");

        // 실패 항목은 이벤트 요약에만 나타난다
        let mut saw_degraded_notice = false;
        let mut summary = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                crate::domain::events::ResearchEvent::Notice { message, .. } => {
                    if message == "일부 상품의 리서치에 실패했습니다" {
                        saw_degraded_notice = true;
                    }
                }
                crate::domain::events::ResearchEvent::Completed(s) => summary = Some(s),
                _ => {}
            }
        }
        assert!(saw_degraded_notice);
        let summary = summary.expect("completion event not emitted");
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].item.item_id, "2");

        // 실행은 Finalizing을 거쳐 완료 상태에 도달한다
        let job = job_manager.get_job(handoff.project_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn total_failure_still_finalizes_with_empty_handoff() {
        let service = Arc::new(MockResearchService::failing_on(&["1", "2", "3"]));
        let config = ResearchEngineConfig { batch_delay_ms: 0, ..Default::default() };
        let (engine, job_manager, _) = engine(Arc::clone(&service), config);

        let handoff = engine.execute(records(3), CancellationToken::new()).await.unwrap();
        assert!(handoff.completed.is_empty());

        let job = job_manager.get_job(handoff.project_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.failed, 3);
    }

    #[tokio::test]
    async fn empty_selection_rejected_before_any_call() {
        let service = Arc::new(MockResearchService::new());
        let (engine, job_manager, emitter) =
            engine(Arc::clone(&service), ResearchEngineConfig::default());
        let mut rx = emitter.subscribe();

        let result = engine.execute(Vec::new(), CancellationToken::new()).await;
        assert!(matches!(result, Err(ResearchError::EmptySelection)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(job_manager.active_jobs().await.is_empty());

        // 반복 호출해도 안전한 no-op
        let result = engine.execute(Vec::new(), CancellationToken::new()).await;
        assert!(matches!(result, Err(ResearchError::EmptySelection)));

        match rx.try_recv().unwrap() {
            crate::domain::events::ResearchEvent::Notice { message, .. } => {
                assert_eq!(message, "선택된 상품이 없습니다");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_selection_rejected_before_any_call() {
        let service = Arc::new(MockResearchService::new());
        let config = ResearchEngineConfig { max_items_per_run: 3, ..Default::default() };
        let (engine, _, _) = engine(Arc::clone(&service), config);

        let result = engine.execute(records(4), CancellationToken::new()).await;
        assert!(matches!(result, Err(ResearchError::TooManyItems { max: 3, received: 4 })));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_later_batches_but_finalizes() {
        let token = CancellationToken::new();
        let mut service = MockResearchService::new();
        service.cancel_after_first = Some(token.clone());
        let service = Arc::new(service);

        let config = ResearchEngineConfig { batch_delay_ms: 0, ..Default::default() };
        let (engine, job_manager, _) = engine(Arc::clone(&service), config);

        let handoff = engine.execute(records(6), token).await.unwrap();

        // 첫 배치(2건)만 디스패치되고 이후 배치는 시작되지 않는다
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(handoff.completed.len(), 2);

        let job = job_manager.get_job(handoff.project_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn progress_messages_count_up_per_batch() {
        let service = Arc::new(MockResearchService::new());
        let config = ResearchEngineConfig { batch_delay_ms: 0, ..Default::default() };
        let (engine, _, emitter) = engine(Arc::clone(&service), config);
        let mut rx = emitter.subscribe();

        engine.execute(records(3), CancellationToken::new()).await.unwrap();

        let mut messages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let crate::domain::events::ResearchEvent::Progress(p) = event {
                messages.push(p.message);
            }
        }
        assert_eq!(messages, vec!["2/3 상품 리서치 완료", "3/3 상품 리서치 완료"]);
    }
}
