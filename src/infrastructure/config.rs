//! Configuration infrastructure
//!
//! Configuration is organized into two tiers:
//! 1. User-configurable settings (exposed in the UI shell)
//! 2. Hidden/Advanced settings (config file only)
//!
//! View preferences live here too and are passed into the aggregation and
//! research engines as explicit arguments — the core never reads them
//! ambiently, so it stays testable without a browser-like environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::domain::aggregation::PriceSort;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::research_engine::ResearchEngineConfig;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-configurable settings (exposed in the UI shell)
    pub user: UserConfig,

    /// Hidden/Advanced settings (config file only)
    pub advanced: AdvancedConfig,
}

/// User-configurable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Delay between requests in milliseconds
    pub request_delay_ms: u64,

    /// Batch processing configuration
    pub batch: BatchConfig,

    /// View preferences, injected into the engines per call
    pub preferences: ViewPreferences,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 500,
            batch: BatchConfig::default(),
            preferences: ViewPreferences::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Batch processing configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of items dispatched concurrently per batch (배치 크기)
    pub batch_size: usize,

    /// Delay between batches in milliseconds
    pub batch_delay_ms: u64,

    /// Maximum items allowed in one research run
    pub max_items_per_run: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let defaults = ResearchEngineConfig::default();
        Self {
            batch_size: defaults.batch_size,
            batch_delay_ms: defaults.batch_delay_ms,
            max_items_per_run: defaults.max_items_per_run,
        }
    }
}

/// Result list rendering mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Card,
    List,
}

/// Persisted view preferences (이전에는 브라우저 로컬 스토리지에 저장).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub view_type: ViewType,
    pub price_sort: PriceSort,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
        }
    }
}

/// Hidden/Advanced settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// External service endpoints
    pub endpoints: ServiceEndpoints,

    /// Timeout for HTTP requests in seconds
    pub request_timeout_seconds: u64,

    /// Global request-rate ceiling
    pub max_requests_per_second: u32,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            request_timeout_seconds: 30,
            max_requests_per_second: 5,
        }
    }
}

/// The four black-box service endpoints plus the results view target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub search_url: String,
    pub category_url: String,
    pub deeplink_url: String,
    pub research_url: String,
    pub results_base_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            search_url: "http://localhost:8000/api/v1/products/search".to_string(),
            category_url: "http://localhost:8000/api/v1/products/bestcategories".to_string(),
            deeplink_url: "http://localhost:8000/api/v1/deeplink".to_string(),
            research_url: "http://localhost:8000/api/v1/product-research".to_string(),
            results_base_url: "http://localhost:3000/research-results".to_string(),
        }
    }
}

impl AppConfig {
    /// Default config file path: `<config dir>/linkpick/settings.json`.
    pub fn default_config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("플랫폼 설정 디렉터리를 찾을 수 없습니다")?;
        Ok(base.join("linkpick").join("settings.json"))
    }

    /// Load the configuration, writing defaults on first run.
    pub async fn load() -> Result<Self> {
        let path = Self::default_config_path()?;
        Self::load_from(&path).await
    }

    /// Load from an explicit path, creating it with defaults when missing.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            let config = Self::default();
            config.save_to(path).await?;
            info!("기본 설정 파일 생성: {}", path.display());
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("설정 파일 파싱 실패: {}", path.display()))?;
        Ok(config)
    }

    /// Persist the configuration as pretty-printed JSON.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("설정 디렉터리 생성 실패: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("설정 직렬화 실패")?;
        fs::write(path, contents)
            .await
            .with_context(|| format!("설정 파일 저장 실패: {}", path.display()))?;
        Ok(())
    }

    /// Engine settings derived from this configuration.
    pub fn research_engine_config(&self) -> ResearchEngineConfig {
        ResearchEngineConfig {
            batch_size: self.user.batch.batch_size,
            batch_delay_ms: self.user.batch.batch_delay_ms,
            max_items_per_run: self.user.batch.max_items_per_run,
        }
    }

    /// HTTP client settings derived from this configuration.
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout_seconds: self.advanced.request_timeout_seconds,
            max_requests_per_second: self.advanced.max_requests_per_second,
            ..HttpClientConfig::default()
        }
    }
}
