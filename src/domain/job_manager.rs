//! Memory-based research run state management
//!
//! Run state lives in memory only: a run is registered when the user
//! triggers research, updated after every batch, and discarded after the
//! handoff (finished entries linger briefly for statistics until cleanup).
//! Nothing survives a process restart by design.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Current status of a research run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Running,
    Finalizing,
    Completed,
    Failed,
}

/// Real-time research run state (kept in memory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchJobState {
    pub project_id: Uuid,
    pub status: JobStatus,
    pub total_items: u32,
    pub processed_items: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub current_batch: u32,
    pub total_batches: u32,
    pub error_details: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate statistics over all known runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStats {
    pub total_jobs: usize,
    pub jobs_by_status: HashMap<JobStatus, usize>,
}

/// Thread-safe registry of research runs.
#[derive(Debug, Default)]
pub struct JobManager {
    jobs: Arc<RwLock<HashMap<Uuid, ResearchJobState>>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh run. The caller supplies the project id so every
    /// per-item request can be correlated with it.
    pub async fn start_job(&self, project_id: Uuid, total_items: u32, total_batches: u32) {
        let now = Utc::now();
        let state = ResearchJobState {
            project_id,
            status: JobStatus::Running,
            total_items,
            processed_items: 0,
            succeeded: 0,
            failed: 0,
            current_batch: 0,
            total_batches,
            error_details: Vec::new(),
            started_at: now,
            last_updated_at: now,
            completed_at: None,
        };
        let mut jobs = self.jobs.write().await;
        jobs.insert(project_id, state);
        tracing::info!("리서치 작업 시작: {} ({}개 상품)", project_id, total_items);
    }

    /// Update counters after a settled batch (memory-only, very fast).
    pub async fn update_progress(
        &self,
        project_id: Uuid,
        processed_items: u32,
        succeeded: u32,
        failed: u32,
        current_batch: u32,
    ) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&project_id) {
            job.processed_items = processed_items;
            job.succeeded = succeeded;
            job.failed = failed;
            job.current_batch = current_batch;
            job.last_updated_at = Utc::now();
        }
    }

    /// Record one contained per-item failure.
    pub async fn add_error(&self, project_id: Uuid, error: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&project_id) {
            job.error_details.push(error);
            job.last_updated_at = Utc::now();
        }
    }

    /// All batches settled; handoff assembly in progress.
    pub async fn begin_finalize(&self, project_id: Uuid) {
        self.set_status(project_id, JobStatus::Finalizing).await;
    }

    /// Terminal success. The entry stays for statistics until cleanup.
    pub async fn complete_job(&self, project_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&project_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.last_updated_at = Utc::now();
        }
    }

    /// Terminal failure outside per-item containment. Guarantees the run
    /// never stays visible as "Running" on an uncaught path.
    pub async fn fail_job(&self, project_id: Uuid, error: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&project_id) {
            job.status = JobStatus::Failed;
            job.error_details.push(error);
            job.completed_at = Some(Utc::now());
            job.last_updated_at = Utc::now();
        }
    }

    async fn set_status(&self, project_id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&project_id) {
            job.status = status;
            job.last_updated_at = Utc::now();
        }
    }

    pub async fn get_job(&self, project_id: Uuid) -> Option<ResearchJobState> {
        let jobs = self.jobs.read().await;
        jobs.get(&project_id).cloned()
    }

    /// Runs still in flight (running or finalizing).
    pub async fn active_jobs(&self) -> Vec<ResearchJobState> {
        let jobs = self.jobs.read().await;
        jobs.values()
            .filter(|job| matches!(job.status, JobStatus::Running | JobStatus::Finalizing))
            .cloned()
            .collect()
    }

    pub async fn statistics(&self) -> JobStats {
        let jobs = self.jobs.read().await;
        let mut by_status = HashMap::new();
        for job in jobs.values() {
            *by_status.entry(job.status.clone()).or_insert(0) += 1;
        }
        JobStats { total_jobs: jobs.len(), jobs_by_status: by_status }
    }

    /// Drop finished runs older than `max_age`. Returns how many were removed.
    pub async fn cleanup_finished(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.status {
            JobStatus::Completed | JobStatus::Failed => {
                job.completed_at.is_none_or(|at| at > cutoff)
            }
            _ => true,
        });
        before - jobs.len()
    }

    pub async fn remove_job(&self, project_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        jobs.remove(&project_id);
    }
}
