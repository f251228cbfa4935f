use crate::{codec, RecommenderError, Result};
use memmap2::Mmap;
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Tolerance used when verifying that vectors are unit length.
pub const DEFAULT_NORMALIZATION_EPSILON: f32 = 1e-3;

/// One collection of embeddings, loaded once and immutable afterwards.
///
/// Vector memory is a single contiguous row-major block; records are rows
/// into that block, looked up by string id through a derived index.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Array2<f32>,
}

impl EmbeddingStore {
    /// Build a store from its parts, deriving the id index.
    pub fn from_parts(ids: Vec<String>, vectors: Array2<f32>) -> Result<Self> {
        if ids.len() != vectors.nrows() {
            return Err(RecommenderError::CorruptStore(format!(
                "{} ids but {} vector rows",
                ids.len(),
                vectors.nrows()
            )));
        }

        let mut index = HashMap::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), position).is_some() {
                return Err(RecommenderError::DuplicateId(id.clone()));
            }
        }

        Ok(Self {
            ids,
            index,
            vectors,
        })
    }

    /// Load a store by memory-mapping the file and decoding its bytes.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RecommenderError::StoreLoad(format!(
                "Failed to open embeddings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let len = file
            .metadata()
            .map_err(|e| {
                RecommenderError::StoreLoad(format!(
                    "Failed to stat embeddings file {}: {}",
                    path.display(),
                    e
                ))
            })?
            .len();
        if len == 0 {
            // An empty file cannot be mapped; decode reports the truncation.
            return codec::decode(&[]);
        }

        // Safety: the mapping is read-only and dropped before this call returns.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            RecommenderError::StoreLoad(format!(
                "Failed to map embeddings file {}: {}",
                path.display(),
                e
            ))
        })?;

        codec::decode(&mmap)
    }

    /// Load a store and verify every vector is unit length within `epsilon`.
    pub fn load_validated<P: AsRef<Path>>(path: P, epsilon: f32) -> Result<Self> {
        let store = Self::load(path)?;
        store.validate_normalized(epsilon)?;
        Ok(store)
    }

    /// Write the store in the embedding file format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, codec::encode(self)).map_err(|e| {
            RecommenderError::StoreLoad(format!(
                "Failed to write embeddings file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn validate_normalized(&self, epsilon: f32) -> Result<()> {
        for (id, vector) in self.iter() {
            let magnitude = vector.dot(&vector).sqrt();
            if (magnitude - 1.0).abs() > epsilon {
                return Err(RecommenderError::UnnormalizedVector {
                    id: id.to_string(),
                    magnitude,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<ArrayView1<'_, f32>> {
        self.index.get(id).map(|&position| self.vectors.row(position))
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id_at(&self, position: usize) -> &str {
        &self.ids[position]
    }

    /// Iterate records in stored (on-disk) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f32>)> {
        self.ids
            .iter()
            .map(|id| id.as_str())
            .zip(self.vectors.outer_iter())
    }
}
