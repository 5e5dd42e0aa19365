//! In-memory clipboard implementation
//!
//! The OS clipboard belongs to whatever shell hosts this crate; headless
//! runs and tests write into this buffer instead.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::services::ClipboardPort;

/// Clipboard that keeps the last written text in memory.
#[derive(Debug, Default)]
pub struct BufferClipboard {
    contents: RwLock<Option<String>>,
}

impl BufferClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last text written, if any.
    pub async fn read_text(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait]
impl ClipboardPort for BufferClipboard {
    async fn write_text(&self, text: &str) -> anyhow::Result<()> {
        let mut contents = self.contents.write().await;
        *contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_last_written_text() {
        let clipboard = BufferClipboard::new();
        assert!(clipboard.read_text().await.is_none());
        clipboard.write_text("https://a\nhttps://b").await.unwrap();
        assert_eq!(clipboard.read_text().await.unwrap(), "https://a\nhttps://b");
    }
}
