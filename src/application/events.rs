//! Event emission system for real-time communication with the UI shell
//!
//! A centralized emitter the research engine and action gate publish
//! through. Consumers subscribe to a broadcast channel; a run never fails
//! because nobody is listening.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::domain::events::{NoticeLevel, ResearchEvent, ResearchProgress, RunSummary};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast-backed event emitter.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<ResearchEvent>,
    /// Whether event emission is enabled
    enabled: Arc<RwLock<bool>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx, enabled: Arc::new(RwLock::new(true)) }
    }

    /// Subscribe to all subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ResearchEvent> {
        self.tx.subscribe()
    }

    /// Enable or disable event emission.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut guard = self.enabled.write().await;
        *guard = enabled;
        debug!("event emission {}", if enabled { "enabled" } else { "disabled" });
    }

    pub async fn is_enabled(&self) -> bool {
        *self.enabled.read().await
    }

    /// Emit one event. A send error only means there are no subscribers;
    /// that must never interrupt the workflow that emitted it.
    pub async fn emit(&self, event: ResearchEvent) {
        if !self.is_enabled().await {
            return;
        }
        let name = event.event_name();
        match self.tx.send(event) {
            Ok(receivers) => debug!("emitted event {} to {} receiver(s)", name, receivers),
            Err(_) => debug!("no subscribers for event {}", name),
        }
    }

    pub async fn emit_progress(&self, progress: ResearchProgress) {
        self.emit(ResearchEvent::Progress(progress)).await;
    }

    pub async fn emit_notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(ResearchEvent::Notice { level, message: message.into() }).await;
    }

    pub async fn emit_modal_opened(&self) {
        self.emit(ResearchEvent::ModalOpened).await;
    }

    pub async fn emit_modal_closed(&self) {
        self.emit(ResearchEvent::ModalClosed).await;
    }

    pub async fn emit_completed(&self, summary: RunSummary) {
        self.emit(ResearchEvent::Completed(summary)).await;
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
