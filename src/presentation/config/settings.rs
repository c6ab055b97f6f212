use std::collections::BTreeMap;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::ports::DistanceMetric;
use crate::application::services::{ConfigurationError, PipelineConfiguration, StagePolicy};
use crate::domain::Stage;

use super::Environment;

/// Typed settings, layered from `appsettings.{env}.toml` and `APP_`-prefixed
/// environment variables (`APP_SERVER__PORT=9000`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub pipeline: PipelineSettings,
    pub embeddings: EmbeddingsSettings,
    pub openai: OpenAiSettings,
    pub media: MediaSettings,
    pub documents: DocumentSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub persistence: PersistenceMode,
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            persistence: PersistenceMode::Memory,
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderSetting {
    #[default]
    Local,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub provider: StorageProviderSetting,
    pub local_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageProviderSetting::Local,
            local_path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StageOverride {
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub worker_count: usize,
    pub stage_timeout_secs: u64,
    pub max_retries: u32,
    pub retrieval_top_k: usize,
    pub distance_metric: DistanceMetric,
    pub sweep_interval_secs: u64,
    pub stages: BTreeMap<Stage, StageOverride>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let defaults = PipelineConfiguration::default();
        let policy = StagePolicy::default();
        Self {
            worker_count: defaults.worker_count,
            stage_timeout_secs: policy.timeout.as_secs(),
            max_retries: policy.max_retries,
            retrieval_top_k: defaults.retrieval_top_k,
            distance_metric: defaults.distance_metric,
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
            stages: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingsSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "text-embedding-3-small".to_string(),
            dimension: PipelineConfiguration::default().embedding_dimension,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub transcription_model: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            transcription_model: "whisper-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub max_file_size_mb: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_file_size_mb: 500,
        }
    }
}

impl MediaSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// TrueType font used in PDFs for characters the bundled fonts lack,
    /// e.g. a CJK face.
    pub pdf_fallback_font: Option<String>,
}

impl Settings {
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn pipeline_configuration(&self) -> Result<PipelineConfiguration, ConfigurationError> {
        let pipeline = &self.pipeline;
        let default_policy = StagePolicy {
            timeout: Duration::from_secs(pipeline.stage_timeout_secs),
            max_retries: pipeline.max_retries,
        };

        let mut configuration =
            PipelineConfiguration::new(pipeline.worker_count, self.embeddings.dimension)
                .with_default_policy(default_policy)
                .with_distance_metric(pipeline.distance_metric)
                .with_retrieval_top_k(pipeline.retrieval_top_k)
                .with_sweep_interval(Duration::from_secs(pipeline.sweep_interval_secs.max(1)));

        for (stage, stage_override) in &pipeline.stages {
            if !stage.is_executable() {
                return Err(ConfigurationError::Invalid(format!(
                    "stage {} has no executor to configure",
                    stage
                )));
            }
            let policy = StagePolicy {
                timeout: stage_override
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(default_policy.timeout),
                max_retries: stage_override.max_retries.unwrap_or(default_policy.max_retries),
            };
            configuration = configuration.with_stage_policy(*stage, policy);
        }

        configuration.validate()?;
        Ok(configuration)
    }
}
