//! Selection action gate
//!
//! Gates the two selection-driven operations (copy links, generate
//! research) behind an explicit non-empty-selection check, so an expensive
//! or destructive action can never start from an empty choice. The gate
//! owns nothing: selection state stays with the caller, research runs are
//! the engine's business.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::events::EventEmitter;
use crate::domain::events::NoticeLevel;
use crate::domain::research::{ResearchError, ResearchHandoff};
use crate::domain::selection::{SelectableItem, SelectionSet};
use crate::domain::services::ClipboardPort;
use crate::infrastructure::research_engine::BatchResearchEngine;

/// Outcome of asking the gate to act on the current selection.
#[derive(Debug)]
pub enum GateDecision {
    /// Nothing selected (or nothing resolvable) — a notice was shown,
    /// no state changed. Safe to request again.
    NoSelection,
    /// Action-choice surface is open over these resolved items.
    AwaitingChoice(Vec<SelectableItem>),
}

pub struct ActionGate {
    clipboard: Arc<dyn ClipboardPort>,
    engine: Arc<BatchResearchEngine>,
    emitter: EventEmitter,
}

impl ActionGate {
    pub fn new(
        clipboard: Arc<dyn ClipboardPort>,
        engine: Arc<BatchResearchEngine>,
        emitter: EventEmitter,
    ) -> Self {
        Self { clipboard, engine, emitter }
    }

    /// Open the action-choice surface for a non-empty selection.
    ///
    /// Stale ids resolve to nothing; a selection that resolves to zero
    /// items is treated the same as an empty one.
    pub async fn request_action(
        &self,
        selection: &SelectionSet,
        view: &[SelectableItem],
    ) -> GateDecision {
        if selection.is_empty() {
            self.emitter.emit_notice(NoticeLevel::Warning, "선택된 상품이 없습니다").await;
            return GateDecision::NoSelection;
        }

        let resolved: Vec<SelectableItem> =
            selection.resolve(view).into_iter().cloned().collect();
        if resolved.is_empty() {
            warn!("선택 항목이 현재 결과에서 모두 사라짐 ({}개 id)", selection.len());
            self.emitter.emit_notice(NoticeLevel::Warning, "선택된 상품이 없습니다").await;
            return GateDecision::NoSelection;
        }

        self.emitter.emit_modal_opened().await;
        GateDecision::AwaitingChoice(resolved)
    }

    /// Copy the most specific URL of every resolved item to the clipboard,
    /// newline-joined. Failure is reported and leaves the selection alone;
    /// the choice surface closes either way once the operation settled.
    pub async fn copy_links(&self, items: &[SelectableItem]) -> anyhow::Result<usize> {
        let links: Vec<&str> = items.iter().map(SelectableItem::best_url).collect();
        let text = links.join("\n");

        let result = self.clipboard.write_text(&text).await;
        match &result {
            Ok(()) => {
                self.emitter
                    .emit_notice(
                        NoticeLevel::Info,
                        format!("{}개 링크가 복사되었습니다", links.len()),
                    )
                    .await;
            }
            Err(e) => {
                warn!("클립보드 복사 실패: {}", e);
                self.emitter
                    .emit_notice(NoticeLevel::Error, "링크 복사에 실패했습니다")
                    .await;
            }
        }
        self.emitter.emit_modal_closed().await;
        result.map(|()| links.len())
    }

    /// Delegate research generation to the batch engine. Only product rows
    /// carry enough data to research; deep-link rows are skipped. The
    /// engine closes the choice surface on every exit path.
    pub async fn generate_research(
        &self,
        items: &[SelectableItem],
        cancellation: CancellationToken,
    ) -> Result<ResearchHandoff, ResearchError> {
        let records = items
            .iter()
            .filter_map(|item| match item {
                SelectableItem::Product { record, .. } => Some(record.clone()),
                SelectableItem::DeepLink { .. } => None,
            })
            .collect();
        let result = self.engine.execute(records, cancellation).await;
        // 엔진이 실행 전에 거부하면 finalize를 타지 않으므로 여기서 모달을 닫는다
        if matches!(
            result,
            Err(ResearchError::EmptySelection | ResearchError::TooManyItems { .. })
        ) {
            self.emitter.emit_modal_closed().await;
        }
        result
    }
}
