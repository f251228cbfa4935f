use crate::Result;
use anyhow::Context;
use ndarray::{Array1, ArrayView1};
use std::path::Path;

/// Cosine similarity for vectors that may not be normalized. Zero-norm
/// inputs score 0.0 rather than dividing by zero.
pub fn cosine_similarity(v1: ArrayView1<'_, f32>, v2: ArrayView1<'_, f32>) -> f32 {
    let dot_product = v1.dot(&v2);
    let norm1 = v1.dot(&v1).sqrt();
    let norm2 = v2.dot(&v2).sqrt();

    if norm1 == 0.0 || norm2 == 0.0 {
        0.0
    } else {
        dot_product / (norm1 * norm2)
    }
}

pub fn normalize_vector(vector: &Array1<f32>) -> Array1<f32> {
    let magnitude = vector.dot(vector).sqrt();
    if magnitude > 0.0 {
        vector / magnitude
    } else {
        vector.clone()
    }
}

/// Random unit vectors for tests and benchmarks.
pub fn generate_random_unit_vectors(dim: usize, num: usize) -> Vec<Array1<f32>> {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    (0..num)
        .map(|_| {
            let v = Array1::from_vec((0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect());
            normalize_vector(&v)
        })
        .collect()
}

/// Read a newline-separated id list, skipping empty lines. Produced by the
/// data-prep collaborators; not consulted on the query path.
pub fn load_id_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read id list {}", path.as_ref().display()))?;

    Ok(contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect())
}
