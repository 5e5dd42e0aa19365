//! Infrastructure layer for external integrations
//!
//! HTTP clients for the black-box services, the batch research engine,
//! configuration loading and logging setup.

pub mod clipboard;
pub mod config;
pub mod http_client;
pub mod listing_client;
pub mod logging;
pub mod research_client;
pub mod research_engine;

// Re-export commonly used items
pub use clipboard::BufferClipboard;
pub use config::AppConfig;
pub use http_client::{HttpClient, HttpClientConfig};
pub use listing_client::HttpListingClient;
pub use research_client::HttpResearchClient;
pub use research_engine::{BatchResearchEngine, ResearchEngineConfig};
