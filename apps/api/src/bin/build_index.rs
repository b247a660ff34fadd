//! Offline index builder.
//!
//! Usage: `build_index <jobs.json> [index_dir]`
//!
//! Reads the job catalog, embeds every job's corpus text in one batch through
//! the same embedding provider the service uses, normalizes, and atomically
//! writes the vector blob + metadata pair. Rebuilding regenerates both files
//! together so they can never drift apart.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::config::Config;
use api::embedding::{EmbeddingProvider, HttpEmbedder};
use api::index::{persist_artifacts, VectorIndex};
use api::models::job::JobRecord;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let jobs_path = PathBuf::from(
        args.next()
            .context("Usage: build_index <jobs.json> [index_dir]")?,
    );
    let index_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.index_dir));

    let raw = fs::read_to_string(&jobs_path)
        .with_context(|| format!("Failed to read {}", jobs_path.display()))?;
    let jobs: Vec<JobRecord> =
        serde_json::from_str(&raw).context("Job catalog is not valid JSON")?;

    if jobs.is_empty() {
        bail!("Job catalog {} is empty", jobs_path.display());
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(jobs.len());
    for job in &jobs {
        if !seen.insert(job.job_id.as_str()) {
            warn!(
                "Duplicate job_id '{}' in catalog; first occurrence wins for id lookups",
                job.job_id
            );
        }
    }

    info!("Loaded {} jobs from {}", jobs.len(), jobs_path.display());

    let texts: Vec<String> = jobs.iter().map(JobRecord::corpus_text).collect();
    let embedder = HttpEmbedder::new(&config)?;
    let raw_vectors = embedder.encode(&texts).await?;
    info!(
        "Embedded {} jobs (dim {})",
        raw_vectors.len(),
        config.embedding_dimensions
    );

    let index = VectorIndex::build(config.embedding_dimensions, raw_vectors)?;
    persist_artifacts(&index, &jobs, &index_dir)?;

    info!("Index build complete: {}", index_dir.display());
    Ok(())
}
