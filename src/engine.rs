use crate::store::EmbeddingStore;
use crate::{RecommenderError, Result};
use ndarray::ArrayView1;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

// How many rows to score between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 4096;

/// One scan candidate. Ordered so that the *worst* candidate is the
/// greatest: lower score first, and among equal scores the later store
/// position. The heap root is therefore always the eviction candidate,
/// and an ascending sort yields the final ranking.
#[derive(Debug, PartialEq)]
struct Candidate {
    score: f32,
    position: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rank the `k` most similar records in `store`, descending by dot-product
/// score, excluding candidates below `threshold`.
///
/// Both the query and the stored vectors are expected pre-normalized, so
/// the dot product equals cosine similarity; callers that cannot guarantee
/// this must normalize first (see [`crate::utils::normalize_vector`]).
/// Equal scores rank by original store order.
pub fn top_k(
    query: ArrayView1<'_, f32>,
    store: &EmbeddingStore,
    k: usize,
    threshold: f32,
) -> Result<Vec<(String, f32)>> {
    top_k_with_deadline(query, store, k, threshold, None)
}

/// [`top_k`] with an advisory per-query time budget. The deadline is
/// checked periodically during the scan; exceeding it aborts this query
/// only, leaving the store untouched.
pub fn top_k_with_deadline(
    query: ArrayView1<'_, f32>,
    store: &EmbeddingStore,
    k: usize,
    threshold: f32,
    deadline: Option<Instant>,
) -> Result<Vec<(String, f32)>> {
    if query.len() != store.dim() {
        return Err(RecommenderError::DimensionMismatch {
            expected: store.dim(),
            actual: query.len(),
        });
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    // Bounded min-heap of the k best seen so far; O(N log k) instead of
    // materializing and sorting all N scores.
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);

    for (position, (_, vector)) in store.iter().enumerate() {
        if position % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(RecommenderError::Timeout(format!(
                        "scan aborted after {} of {} candidates",
                        position,
                        store.len()
                    )));
                }
            }
        }

        let score = query.dot(&vector);
        if score < threshold {
            continue;
        }

        let candidate = Candidate { score, position };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            // Candidates arrive in store order, so on a tie the earlier
            // position already in the heap wins.
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    let mut ranked = heap.into_vec();
    ranked.sort_unstable();

    Ok(ranked
        .into_iter()
        .map(|c| (store.id_at(c.position).to_string(), c.score))
        .collect())
}
