use crate::store::EmbeddingStore;
use crate::{RecommenderError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use ndarray::Array2;
use std::io::{Cursor, Read};

// Embedding file layout, little-endian throughout:
//
//   u32 count          number of records (N)
//   u32 dim            embedding dimension (D)
//   N x { u32 len; [u8; len] utf8 id }
//   [f32; N * D]       row-major, record i at offset i * D
//
// The format matches the offline trainer's exporter byte for byte.

fn corrupt(msg: impl Into<String>) -> RecommenderError {
    RecommenderError::CorruptStore(msg.into())
}

/// Decode an embedding file image into a store.
///
/// Vectors are trusted to be pre-normalized by the producer; use
/// [`EmbeddingStore::load_validated`] to verify magnitudes on load.
pub fn decode(bytes: &[u8]) -> Result<EmbeddingStore> {
    let mut cursor = Cursor::new(bytes);

    let count = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| corrupt("truncated header: missing record count"))? as usize;
    let dim = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| corrupt("truncated header: missing dimension"))? as usize;

    if count > 0 && dim == 0 {
        return Err(corrupt(format!(
            "header declares {} records with zero dimension",
            count
        )));
    }

    // Read IDs
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let len = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| corrupt(format!("truncated id entry {}", i)))? as usize;
        if len == 0 {
            return Err(corrupt(format!("id entry {} has zero length", i)));
        }
        let mut buf = vec![0u8; len];
        cursor
            .read_exact(&mut buf)
            .map_err(|_| corrupt(format!("truncated id entry {}", i)))?;
        let id = String::from_utf8(buf)
            .map_err(|_| corrupt(format!("id entry {} is not valid UTF-8", i)))?;
        ids.push(id);
    }

    // Read the contiguous vector block; it must account for every
    // remaining byte exactly.
    let total_floats = count
        .checked_mul(dim)
        .ok_or_else(|| corrupt("vector block size overflows"))?;
    let expected_bytes = total_floats
        .checked_mul(std::mem::size_of::<f32>())
        .ok_or_else(|| corrupt("vector block size overflows"))?;
    let remaining = bytes.len() - cursor.position() as usize;
    if remaining != expected_bytes {
        return Err(corrupt(format!(
            "vector block is {} bytes, expected {}",
            remaining, expected_bytes
        )));
    }

    let mut values = vec![0f32; total_floats];
    cursor
        .read_f32_into::<LittleEndian>(&mut values)
        .map_err(|_| corrupt("truncated vector block"))?;

    let vectors = Array2::from_shape_vec((count, dim), values)
        .map_err(|e| corrupt(format!("vector block has invalid shape: {}", e)))?;

    EmbeddingStore::from_parts(ids, vectors)
}

/// Encode a store back into the embedding file format.
///
/// Re-encoding a decoded store produces byte-identical output.
pub fn encode(store: &EmbeddingStore) -> Vec<u8> {
    let ids_bytes: usize = store.iter().map(|(id, _)| 4 + id.len()).sum();
    let mut out =
        Vec::with_capacity(8 + ids_bytes + store.len() * store.dim() * std::mem::size_of::<f32>());

    out.extend_from_slice(&(store.len() as u32).to_le_bytes());
    out.extend_from_slice(&(store.dim() as u32).to_le_bytes());

    for (id, _) in store.iter() {
        out.extend_from_slice(&(id.len() as u32).to_le_bytes());
        out.extend_from_slice(id.as_bytes());
    }

    for (_, vector) in store.iter() {
        for value in vector.iter() {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    out
}
