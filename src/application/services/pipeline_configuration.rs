use std::collections::BTreeMap;
use std::time::Duration;

use crate::application::ports::DistanceMetric;
use crate::domain::Stage;

const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRIEVAL_TOP_K: usize = 5;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for StagePolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_STAGE_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Process-wide pipeline parameters. Built once at startup and shared
/// read-only with the scheduler and the stage executors.
#[derive(Debug, Clone)]
pub struct PipelineConfiguration {
    pub worker_count: usize,
    pub embedding_dimension: usize,
    pub distance_metric: DistanceMetric,
    pub retrieval_top_k: usize,
    /// How often the scheduler re-reads pending jobs from the store.
    pub sweep_interval: Duration,
    default_policy: StagePolicy,
    stage_policies: BTreeMap<Stage, StagePolicy>,
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            distance_metric: DistanceMetric::Cosine,
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            default_policy: StagePolicy::default(),
            stage_policies: BTreeMap::new(),
        }
    }
}

impl PipelineConfiguration {
    pub fn new(worker_count: usize, embedding_dimension: usize) -> Self {
        Self {
            worker_count,
            embedding_dimension,
            ..Self::default()
        }
    }

    pub fn with_default_policy(mut self, policy: StagePolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_stage_policy(mut self, stage: Stage, policy: StagePolicy) -> Self {
        self.stage_policies.insert(stage, policy);
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn policy(&self, stage: Stage) -> StagePolicy {
        self.stage_policies
            .get(&stage)
            .copied()
            .unwrap_or(self.default_policy)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.worker_count == 0 {
            return Err(ConfigurationError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigurationError::Invalid(
                "embedding_dimension must be at least 1".to_string(),
            ));
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigurationError::Invalid(
                "retrieval_top_k must be at least 1".to_string(),
            ));
        }
        for stage in Stage::EXECUTABLE {
            if self.policy(stage).timeout.is_zero() {
                return Err(ConfigurationError::Invalid(format!(
                    "timeout for stage {} must be positive",
                    stage
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid pipeline configuration: {0}")]
    Invalid(String),
}
