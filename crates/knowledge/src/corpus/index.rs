//! Vector index abstraction and the exact flat-L2 implementation.
//!
//! The index stores one vector per passage; position `i` in the index is
//! passage `i` in the passage store. Nothing here knows about passage text.

use crate::similarity::squared_l2;
use relief_core::{AppError, AppResult};
use std::path::Path;

/// A nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position in the index (and in the passage store)
    pub position: usize,

    /// Index-native distance (squared L2 for [`FlatIndex`])
    pub distance: f32,
}

/// Trait for read-only vector index backends.
///
/// Implementations must be safe for concurrent searches.
pub trait VectorIndex: Send + Sync {
    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Dimension of every stored vector.
    fn dimensions(&self) -> usize;

    /// The `k` nearest vectors, nearest first.
    ///
    /// Returns fewer than `k` results when the index holds fewer vectors.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact brute-force index over squared Euclidean distance.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    /// Row-major `len * dimensions` values
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from individual vectors.
    pub fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::CorpusUnavailable(
                "Index dimension must be at least 1".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (position, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::CorpusUnavailable(format!(
                    "Vector {} has {} dimensions, expected {}",
                    position,
                    vector.len(),
                    dimensions
                )));
            }
            data.extend(vector);
        }

        Ok(Self { dimensions, data })
    }

    /// Build an index from row-major data.
    pub fn from_flat(dimensions: usize, data: Vec<f32>) -> AppResult<Self> {
        if dimensions == 0 || data.len() % dimensions != 0 {
            return Err(AppError::CorpusUnavailable(format!(
                "{} values do not form rows of {} dimensions",
                data.len(),
                dimensions
            )));
        }

        Ok(Self { dimensions, data })
    }

    /// An index with no vectors.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    /// Load a FAISS `IndexFlatL2` file.
    pub fn load_faiss(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::CorpusUnavailable(format!("Failed to read index {:?}: {}", path, e))
        })?;

        let index = faiss::decode_flat_l2(&bytes).map_err(|reason| {
            AppError::CorpusUnavailable(format!("Invalid index file {:?}: {}", path, reason))
        })?;

        tracing::info!(
            vectors = index.len(),
            dimensions = index.dimensions,
            "Loaded flat L2 index from {:?}",
            path
        );

        Ok(index)
    }

    fn row(&self, position: usize) -> &[f32] {
        let start = position * self.dimensions;
        &self.data[start..start + self.dimensions]
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.data.len() / self.dimensions.max(1)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Query vector has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut neighbors: Vec<Neighbor> = (0..self.len())
            .map(|position| Neighbor {
                position,
                distance: squared_l2(query, self.row(position)),
            })
            .collect();

        // Ties resolve to the lower position so results are reproducible
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

/// Reader for the FAISS on-disk layout of flat indexes.
///
/// Layout (little-endian): fourcc, `d: i32`, `ntotal: i64`, two unused
/// `i64`, `is_trained: u8`, `metric_type: i32`, `metric_arg: f32` only when
/// `metric_type > 1`, then a vector of `ntotal * d` floats prefixed by its
/// `u64` element count.
mod faiss {
    use super::FlatIndex;

    const FOURCC_FLAT_L2: &[u8; 4] = b"IxF2";
    const FOURCC_FLAT: &[u8; 4] = b"IxFl";
    const METRIC_L2: i32 = 1;

    struct Reader<'a> {
        bytes: &'a [u8],
        offset: usize,
    }

    impl<'a> Reader<'a> {
        fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
            let end = self
                .offset
                .checked_add(n)
                .filter(|end| *end <= self.bytes.len())
                .ok_or_else(|| format!("truncated at byte {}", self.offset))?;
            let slice = &self.bytes[self.offset..end];
            self.offset = end;
            Ok(slice)
        }

        fn array<const N: usize>(&mut self) -> Result<[u8; N], String> {
            let mut out = [0u8; N];
            out.copy_from_slice(self.take(N)?);
            Ok(out)
        }

        fn i32(&mut self) -> Result<i32, String> {
            self.array().map(i32::from_le_bytes)
        }

        fn i64(&mut self) -> Result<i64, String> {
            self.array().map(i64::from_le_bytes)
        }

        fn u64(&mut self) -> Result<u64, String> {
            self.array().map(u64::from_le_bytes)
        }
    }

    pub(super) fn decode_flat_l2(bytes: &[u8]) -> Result<FlatIndex, String> {
        let mut reader = Reader { bytes, offset: 0 };

        let fourcc: [u8; 4] = reader.array()?;
        if &fourcc != FOURCC_FLAT_L2 && &fourcc != FOURCC_FLAT {
            return Err(format!(
                "unsupported index type {:?}, expected a flat L2 index",
                String::from_utf8_lossy(&fourcc)
            ));
        }

        let d = reader.i32()?;
        let ntotal = reader.i64()?;
        let _dummy = reader.i64()?;
        let _dummy = reader.i64()?;
        let _is_trained = reader.take(1)?;
        let metric_type = reader.i32()?;
        if metric_type > 1 {
            let _metric_arg = reader.take(4)?;
        }

        if metric_type != METRIC_L2 {
            return Err(format!("metric type {} is not L2", metric_type));
        }
        if d <= 0 || ntotal < 0 {
            return Err(format!("invalid header d={} ntotal={}", d, ntotal));
        }

        let dimensions = d as usize;
        let expected = (ntotal as usize)
            .checked_mul(dimensions)
            .ok_or_else(|| "vector count overflows".to_string())?;

        let count = reader.u64()? as usize;
        if count != expected {
            return Err(format!(
                "vector data holds {} floats, header implies {}",
                count, expected
            ));
        }

        let raw = reader.take(
            count
                .checked_mul(4)
                .ok_or_else(|| "vector data overflows".to_string())?,
        )?;
        let data = raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        FlatIndex::from_flat(dimensions, data).map_err(|e| e.to_string())
    }

    #[cfg(test)]
    pub(crate) fn encode_flat_l2(index: &FlatIndex) -> Vec<u8> {
        use super::VectorIndex;

        let mut out = Vec::new();
        out.extend_from_slice(FOURCC_FLAT_L2);
        out.extend_from_slice(&(index.dimensions as i32).to_le_bytes());
        out.extend_from_slice(&(index.len() as i64).to_le_bytes());
        out.extend_from_slice(&(1i64 << 20).to_le_bytes());
        out.extend_from_slice(&(1i64 << 20).to_le_bytes());
        out.push(1);
        out.extend_from_slice(&METRIC_L2.to_le_bytes());
        out.extend_from_slice(&(index.data.len() as u64).to_le_bytes());
        for v in &index.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
pub(crate) use faiss::encode_flat_l2;
