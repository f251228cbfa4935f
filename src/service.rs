use crate::config::Config;
use crate::store::{EmbeddingStore, DEFAULT_NORMALIZATION_EPSILON};
use crate::{engine, RecommenderError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A fully-loaded user/item store pair. Immutable; replaced wholesale on
/// reload so in-flight queries always see one consistent pair.
#[derive(Debug)]
pub struct Snapshot {
    pub users: EmbeddingStore,
    pub items: EmbeddingStore,
}

/// Resident recommendation service.
///
/// All query operations are pure reads over an acquired snapshot and are
/// safe to call concurrently. The read lock is held only long enough to
/// clone the `Arc`, so queries never block a reload and a reload never
/// blocks queries.
#[derive(Debug)]
pub struct Recommender {
    config: Config,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Recommender {
    /// Load both stores and enter the ready state. Any load error aborts
    /// construction; no query is ever served from a partial snapshot.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let snapshot = load_snapshot(&config)?;
        Ok(Self {
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Ranked item ids for a user, scores dropped from the contract.
    pub fn recommend(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .recommend_scored(user_id)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Ranked `(item_id, score)` pairs for a user.
    pub fn recommend_scored(&self, user_id: &str) -> Result<Vec<(String, f32)>> {
        let snapshot = self.snapshot();
        let user = snapshot
            .users
            .get(user_id)
            .ok_or_else(|| RecommenderError::NotFound(format!("user '{}' not found", user_id)))?;

        let params = &self.config.recommendation;
        let deadline = params
            .query_timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let ranked = engine::top_k_with_deadline(
            user,
            &snapshot.items,
            params.top_k,
            params.similarity_threshold,
            deadline,
        )?;

        debug!(user_id, results = ranked.len(), scores = ?ranked, "query complete");
        Ok(ranked)
    }

    /// Similarity score between one user and one item.
    pub fn similarity(&self, user_id: &str, item_id: &str) -> Result<f32> {
        let snapshot = self.snapshot();
        let user = snapshot
            .users
            .get(user_id)
            .ok_or_else(|| RecommenderError::NotFound(format!("user '{}' not found", user_id)))?;
        let item = snapshot
            .items
            .get(item_id)
            .ok_or_else(|| RecommenderError::NotFound(format!("item '{}' not found", item_id)))?;
        Ok(user.dot(&item))
    }

    /// Replace the current snapshot with freshly-loaded stores. The new
    /// pair is built off the hot path; the swap itself is a single
    /// reference store under a brief write lock.
    pub fn reload(&self) -> Result<()> {
        let fresh = load_snapshot(&self.config)?;
        *self.snapshot.write() = Arc::new(fresh);
        Ok(())
    }

    /// The current snapshot. Callers hold it for the duration of their
    /// query; a concurrent reload does not affect it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }
}

fn load_snapshot(config: &Config) -> Result<Snapshot> {
    let load = |path: &std::path::Path| -> Result<EmbeddingStore> {
        if config.recommendation.validate_normalization {
            EmbeddingStore::load_validated(path, DEFAULT_NORMALIZATION_EPSILON)
        } else {
            EmbeddingStore::load(path)
        }
    };

    let users = load(&config.model_paths.user_embeddings)?;
    let items = load(&config.model_paths.item_embeddings)?;

    if users.dim() != items.dim() {
        return Err(RecommenderError::DimensionMismatch {
            expected: users.dim(),
            actual: items.dim(),
        });
    }
    if let Some(expected) = config.recommendation.embedding_dim {
        if expected != users.dim() {
            // Informational cross-check only; the header is authoritative.
            warn!(
                configured = expected,
                actual = users.dim(),
                "configured embedding_dim disagrees with store headers"
            );
        }
    }

    info!(
        users = users.len(),
        items = items.len(),
        dim = users.dim(),
        "loaded embedding snapshot"
    );

    Ok(Snapshot { users, items })
}

/// Render the process-boundary output: one informational header line, then
/// one `- ` prefixed line per item in ranked order. The upstream web layer
/// parses this format from stdout.
pub fn render_recommendations(user_id: &str, items: &[String]) -> String {
    let mut out = format!("Recommendations for user {}:\n", user_id);
    for item in items {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
    out
}
