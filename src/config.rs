use anyhow::{anyhow, Context};
use reqwest::{ClientBuilder, Proxy};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::RetentionPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub file: String,
    pub retention: RetentionPolicy,
    pub duplicate_threshold: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: "output/news_history.json".to_string(),
            retention: RetentionPolicy::Count { max_entries: 36 },
            duplicate_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Platform labels in priority order.
    pub platforms: Vec<String>,
    pub platform_quota: usize,
    pub global_cap: usize,
    pub blocked_keywords: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            platforms: Vec::new(),
            platform_quota: 3,
            global_cap: 9,
            blocked_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeepseekConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub content_char_limit: usize,
    pub history_context_limit: usize,
}

impl Default for DeepseekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 120,
            temperature: 0.3,
            content_char_limit: 800,
            history_context_limit: 10,
        }
    }
}

impl DeepseekConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Surface the selector failure and skip the cycle.
    Abort,
    /// Publish the quota selection with a locally built headline.
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub deepseek: DeepseekConfig,
    pub retry: RetryConfig,
    pub fallback: FallbackPolicy,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            deepseek: DeepseekConfig::default(),
            retry: RetryConfig::default(),
            fallback: FallbackPolicy::Local,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub proxy_url: Option<String>,
}

impl HttpClientConfig {
    pub fn apply(&self, builder: ClientBuilder) -> anyhow::Result<ClientBuilder> {
        match self.proxy_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                let proxy = Proxy::all(url).with_context(|| format!("invalid proxy url {url}"))?;
                Ok(builder.proxy(proxy))
            }
            _ => Ok(builder),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub candidates_file: String,
    pub output_dir: String,
    /// Which pipeline produced the run (home/world/entertainment).
    pub category: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidates_file: "output/candidates.json".to_string(),
            output_dir: "output".to_string(),
            category: "home".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/curator.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub history: HistoryConfig,
    pub selection: SelectionConfig,
    pub ai: AiConfig,
    pub http_client: HttpClientConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        Self::apply_env_overrides(config)
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            config.ai.deepseek.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("DEEPSEEK_BASE_URL") {
            config.ai.deepseek.base_url = base_url;
        }

        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            config.ai.deepseek.model = model;
        }

        if let Ok(file) = std::env::var("HISTORY_FILE") {
            config.history.file = file;
        }

        if let Some(max_entries) = parse_optional_env("HISTORY_MAX_ENTRIES")? {
            config.history.retention = RetentionPolicy::Count { max_entries };
        }

        if let Some(days) = parse_optional_env("HISTORY_DAYS")? {
            config.history.retention = RetentionPolicy::Days { days };
        }

        if let Ok(path) = std::env::var("CANDIDATES_FILE") {
            config.pipeline.candidates_file = path;
        }

        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            config.pipeline.output_dir = dir;
        }

        if let Ok(category) = std::env::var("PIPELINE_CATEGORY") {
            config.pipeline.category = category;
        }

        if let Ok(proxy) = std::env::var("HTTP_PROXY_URL") {
            config.http_client.proxy_url = Some(proxy);
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.selection.global_cap == 0 {
            return Err(anyhow!("selection.global_cap must be at least 1"));
        }

        if !(0.0..=1.0).contains(&self.history.duplicate_threshold) {
            return Err(anyhow!(
                "history.duplicate_threshold must be within [0, 1], got {}",
                self.history.duplicate_threshold
            ));
        }

        if self.history.file.trim().is_empty() {
            return Err(anyhow!(
                "history file missing; set HISTORY_FILE env var or history.file in config file"
            ));
        }

        Ok(())
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    for path in candidates {
        if path.exists() {
            return Some(path);
        }
    }

    None
}
