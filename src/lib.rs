pub mod codec;
pub mod config;
pub mod engine;
pub mod service;
pub mod store;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Config Error: {0}")]
    Config(String),
    #[error("Store Load Error: {0}")]
    StoreLoad(String),
    #[error("Corrupt Store: {0}")]
    CorruptStore(String),
    #[error("Duplicate Id: {0}")]
    DuplicateId(String),
    #[error("Unnormalized Vector: '{id}' has magnitude {magnitude}")]
    UnnormalizedVector { id: String, magnitude: f32 },
    #[error("Dimension Mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Query Timeout: {0}")]
    Timeout(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

// Re-export main types for convenience
pub use config::{Config, ModelPaths, RecommendationConfig};
pub use engine::top_k;
pub use service::{render_recommendations, Recommender, Snapshot};
pub use store::EmbeddingStore;
pub use utils::{cosine_similarity, normalize_vector};
