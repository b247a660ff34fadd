//! Vector Index — in-memory inner-product nearest-neighbor search over
//! normalized job embeddings, plus the persisted artifact pair.
//!
//! Every stored vector is L2-normalized, so the inner product equals cosine
//! similarity. The same normalization MUST be applied to query vectors —
//! a mismatch silently corrupts the similarity semantics.
//!
//! Built offline by the `build_index` bin, loaded read-only at startup,
//! never mutated while serving.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::job::JobRecord;

/// Magic bytes + format version for the binary vector blob.
const INDEX_MAGIC: &[u8; 4] = b"JVIX";
const INDEX_VERSION: u32 = 1;

/// File names inside the index directory. The blob and metadata are written
/// together atomically and must stay positionally synchronized.
pub const INDEX_FILE: &str = "jobs_vectors.idx";
pub const META_FILE: &str = "jobs_meta.json";

/// L2-normalizes a vector in place. Zero vectors are left untouched rather
/// than divided by zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Flat, read-only inner-product index. Row `i` is the vector for catalog
/// position `i`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Builds an index from raw (not yet normalized) embedding vectors.
    /// Normalizes every vector in place before storing it.
    pub fn build(dim: usize, raw_vectors: Vec<Vec<f32>>) -> Result<Self, AppError> {
        if raw_vectors.is_empty() {
            return Err(AppError::Catalog(
                "Cannot build an index over an empty catalog".to_string(),
            ));
        }

        let mut vectors = Vec::with_capacity(raw_vectors.len() * dim);
        for mut v in raw_vectors {
            if v.len() != dim {
                return Err(AppError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
            l2_normalize(&mut v);
            vectors.extend_from_slice(&v);
        }

        Ok(VectorIndex { dim, vectors })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Brute-force inner-product search. Returns up to `k` `(position, score)`
    /// pairs in strictly descending score order; ties break by ascending
    /// catalog position so results are deterministic. `k` is clamped to the
    /// catalog size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, AppError> {
        if query.len() != self.dim {
            return Err(AppError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(pos, row)| {
                let score: f32 = row.iter().zip(query).map(|(a, b)| a * b).sum();
                (pos, score)
            })
            .collect();

        scored.sort_by(|(pos_a, score_a), (pos_b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(pos_a.cmp(pos_b))
        });
        scored.truncate(k.min(self.len()));

        Ok(scored)
    }

    /// Serializes the index to the binary blob format:
    /// magic, version, dim, count (u32 LE), then `dim * count` f32 LE values.
    fn to_bytes(&self) -> Vec<u8> {
        let count = self.len() as u32;
        let mut buf = Vec::with_capacity(16 + self.vectors.len() * 4);
        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.dim as u32).to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        for x in &self.vectors {
            buf.extend_from_slice(&x.to_le_bytes());
        }
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        if bytes.len() < 16 || &bytes[0..4] != INDEX_MAGIC {
            return Err(AppError::Catalog(
                "Index blob is missing the JVIX header".to_string(),
            ));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap_or_default());
        if version != INDEX_VERSION {
            return Err(AppError::Catalog(format!(
                "Unsupported index blob version {version}"
            )));
        }
        let dim = u32::from_le_bytes(bytes[8..12].try_into().unwrap_or_default()) as usize;
        let count = u32::from_le_bytes(bytes[12..16].try_into().unwrap_or_default()) as usize;

        let payload = &bytes[16..];
        if dim == 0 || payload.len() != dim * count * 4 {
            return Err(AppError::Catalog(format!(
                "Index blob payload is truncated: expected {} vectors of dim {dim}",
                count
            )));
        }

        let vectors = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(VectorIndex { dim, vectors })
    }
}

/// Job metadata persisted alongside the vector blob. Array order matches
/// vector positions exactly.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogMeta {
    jobs: Vec<JobRecord>,
}

/// Writes the blob + metadata pair atomically: each file lands via a temp
/// file and rename inside the target directory, so a crashed rebuild never
/// leaves a half-written artifact.
pub fn persist_artifacts(
    index: &VectorIndex,
    jobs: &[JobRecord],
    dir: &Path,
) -> Result<(), AppError> {
    if index.len() != jobs.len() {
        return Err(AppError::Catalog(format!(
            "Vector count {} does not match job count {}",
            index.len(),
            jobs.len()
        )));
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create index directory {}", dir.display()))?;

    write_atomic(dir, INDEX_FILE, &index.to_bytes())?;
    let meta = serde_json::to_vec_pretty(&CatalogMeta {
        jobs: jobs.to_vec(),
    })
    .context("Failed to serialize job metadata")?;
    write_atomic(dir, META_FILE, &meta)?;

    info!(
        "Persisted index artifacts: {} vectors (dim {}) + metadata in {}",
        index.len(),
        index.dim(),
        dir.display()
    );
    Ok(())
}

/// Loads and validates the artifact pair. Fatal at startup if either file is
/// missing, malformed, or the two are out of sync.
pub fn load_artifacts(dir: &Path) -> Result<(VectorIndex, Vec<JobRecord>), AppError> {
    let blob = fs::read(dir.join(INDEX_FILE))
        .with_context(|| format!("Failed to read {}", dir.join(INDEX_FILE).display()))?;
    let index = VectorIndex::from_bytes(&blob)?;

    let meta_raw = fs::read_to_string(dir.join(META_FILE))
        .with_context(|| format!("Failed to read {}", dir.join(META_FILE).display()))?;
    let meta: CatalogMeta =
        serde_json::from_str(&meta_raw).map_err(|e| AppError::Catalog(e.to_string()))?;

    if meta.jobs.is_empty() {
        return Err(AppError::Catalog("Job metadata file is empty".to_string()));
    }
    if meta.jobs.len() != index.len() {
        return Err(AppError::Catalog(format!(
            "Metadata has {} jobs but index has {} vectors",
            meta.jobs.len(),
            index.len()
        )));
    }

    Ok((index, meta.jobs))
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), AppError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("Failed to write {name}"))?;
    tmp.persist(dir.join(name))
        .with_context(|| format!("Failed to persist {name}"))?;
    Ok(())
}
