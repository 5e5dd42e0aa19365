//! Event types for real-time communication with the UI shell
//!
//! The research engine and the action gate never talk to the UI directly;
//! they emit these typed events and whoever hosts the crate renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::research::{ResearchFailure, ResearchPack};

/// Stage of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResearchStage {
    /// No run in progress
    Idle,
    /// Processing batch `current` of `total`
    Running,
    /// All batches settled, assembling the handoff
    Finalizing,
}

impl std::fmt::Display for ResearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchStage::Idle => write!(f, "대기"),
            ResearchStage::Running => write!(f, "리서치 진행"),
            ResearchStage::Finalizing => write!(f, "결과 정리"),
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Progress snapshot emitted after every settled batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchProgress {
    pub project_id: Uuid,
    /// Items processed so far (successes + failures)
    pub current: u32,
    /// Total items in the run
    pub total: u32,
    pub current_batch: u32,
    pub total_batches: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub stage: ResearchStage,
    /// Display message, e.g. "3/6 상품 리서치 완료"
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ResearchProgress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.current) / f64::from(self.total) * 100.0
        }
    }
}

/// Summary of a finished run, attached to the completion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub project_id: Uuid,
    pub total_items: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub duration_ms: u64,
    pub completed: Vec<ResearchPack>,
    pub failures: Vec<ResearchFailure>,
}

impl RunSummary {
    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }

    pub fn is_total_failure(&self) -> bool {
        self.failed > 0 && self.succeeded == 0
    }
}

/// Everything the engine and action gate emit toward the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    Progress(ResearchProgress),
    Notice { level: NoticeLevel, message: String },
    /// Action-choice surface opened for a non-empty selection
    ModalOpened,
    /// Action-choice surface closed; emitted on every run exit path
    ModalClosed,
    Completed(RunSummary),
}

impl ResearchEvent {
    /// Event name used by subscribers to route on, mirroring the tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            ResearchEvent::Progress(_) => "progress",
            ResearchEvent::Notice { .. } => "notice",
            ResearchEvent::ModalOpened => "modal_opened",
            ResearchEvent::ModalClosed => "modal_closed",
            ResearchEvent::Completed(_) => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_zero_safe() {
        let progress = ResearchProgress {
            project_id: Uuid::new_v4(),
            current: 0,
            total: 0,
            current_batch: 0,
            total_batches: 0,
            succeeded: 0,
            failed: 0,
            stage: ResearchStage::Idle,
            message: String::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(progress.percentage(), 0.0);
    }

    #[test]
    fn run_summary_failure_classification() {
        let base = RunSummary {
            project_id: Uuid::new_v4(),
            total_items: 2,
            succeeded: 1,
            failed: 1,
            duration_ms: 10,
            completed: vec![],
            failures: vec![],
        };
        assert!(base.is_partial_failure());
        assert!(!base.is_total_failure());

        let total = RunSummary { succeeded: 0, failed: 2, ..base };
        assert!(total.is_total_failure());
    }
}
