//! Linkpick - Affiliate Product Aggregation & Batch Research Engine
//!
//! Core engine for an affiliate e-commerce research tool: normalizes and
//! groups raw product listings, tracks a stable user selection across
//! views, and drives a batched, partially-failable AI research workflow
//! over the selected products.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the most commonly used entry points
pub use application::{ActionGate, EventEmitter, GateDecision};
pub use domain::aggregation;
pub use domain::{
    GroupedProduct, ProductRecord, ResearchError, ResearchHandoff, ResearchPack, SelectableItem,
    SelectionSet,
};
pub use infrastructure::{AppConfig, BatchResearchEngine, ResearchEngineConfig};
