use crate::{RecommenderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration, deserialized from the deployment's `config.json`.
///
/// Unknown sections written by the packaging scripts (e.g. `training`) are
/// ignored. `data_paths` is accepted for schema compatibility but the
/// engine never reads those files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model_paths: ModelPaths,
    #[serde(default)]
    pub data_paths: Option<DataPaths>,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPaths {
    pub user_embeddings: PathBuf,
    pub item_embeddings: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    pub users: PathBuf,
    pub items: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub top_k: usize,
    pub similarity_threshold: f32,
    /// Informational cross-check only; the authoritative dimension is read
    /// from each store's header.
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default)]
    pub validate_normalization: bool,
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RecommenderError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            RecommenderError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recommendation.top_k == 0 {
            return Err(RecommenderError::Config(
                "recommendation.top_k must be a positive integer".to_string(),
            ));
        }
        if !self.recommendation.similarity_threshold.is_finite() {
            return Err(RecommenderError::Config(
                "recommendation.similarity_threshold must be finite".to_string(),
            ));
        }
        if let Some(0) = self.recommendation.embedding_dim {
            return Err(RecommenderError::Config(
                "recommendation.embedding_dim must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
