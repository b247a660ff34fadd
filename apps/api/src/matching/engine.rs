//! Matching Engine — embeds the resume, retrieves nearest jobs by inner
//! product, and re-ranks with the hybrid score.
//!
//! Hybrid fusion: `score = clamp01(0.70 * semantic + 0.25 * overlap + bonus)`.
//! The semantic and overlap weights sum to 0.95 so the bounded rule bonus
//! cannot push a raw score past 1 by much; clamping covers the rest.
//!
//! The engine is immutable after construction and shared across all requests
//! without locking.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::index::{l2_normalize, VectorIndex};
use crate::matching::skills::skill_overlap;
use crate::models::job::{JobRecord, MatchCandidate};

/// Weight on cosine similarity.
pub const W_SEMANTIC: f32 = 0.70;
/// Weight on the skill-overlap fraction.
pub const W_OVERLAP: f32 = 0.25;
/// Additive bonus when a resume skill appears in the job title.
pub const TITLE_MATCH_BONUS: f32 = 0.05;

/// Over-fetch ahead of hybrid re-ranking so overlap/rule adjustments cannot
/// be starved by premature truncation at the pure-semantic stage.
const OVERFETCH_FACTOR: usize = 3;
const OVERFETCH_MIN: usize = 30;

pub struct MatchEngine {
    index: VectorIndex,
    jobs: Vec<JobRecord>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("index", &self.index)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    /// Builds the engine from loaded artifacts. Validates that the embedder's
    /// output dimension matches the index (a mismatch means a stale artifact)
    /// and that job ids are unique (first occurrence wins otherwise).
    pub fn new(
        index: VectorIndex,
        jobs: Vec<JobRecord>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, AppError> {
        if index.dim() != embedder.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: index.dim(),
                actual: embedder.dimensions(),
            });
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

        info!(
            "Match engine ready: {} jobs, dim {}",
            jobs.len(),
            index.dim()
        );
        Ok(MatchEngine {
            index,
            jobs,
            embedder,
        })
    }

    pub fn catalog_size(&self) -> usize {
        self.jobs.len()
    }

    /// Ranks the catalog against the resume and returns the top `top_k`
    /// candidates by hybrid score. Enrichment fields are left empty.
    pub async fn semantic_match(
        &self,
        resume_text: &str,
        top_k: usize,
        resume_skills: Option<&BTreeSet<String>>,
    ) -> Result<Vec<MatchCandidate>, AppError> {
        if resume_text.trim().is_empty() {
            return Err(AppError::Validation(
                "resume_text cannot be empty".to_string(),
            ));
        }
        if self.jobs.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = self.embedder.encode(&[resume_text.to_string()]).await?;
        let mut query = vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Provider returned no vectors".to_string()))?;
        l2_normalize(&mut query);

        let fetch = (top_k * OVERFETCH_FACTOR)
            .max(OVERFETCH_MIN)
            .min(self.jobs.len());
        let hits = self.index.search(&query, fetch)?;

        let mut candidates: Vec<(usize, MatchCandidate)> = hits
            .into_iter()
            .map(|(pos, semantic_score)| {
                let job = &self.jobs[pos];
                let overlap = resume_skills
                    .map(|skills| skill_overlap(skills, &job.skills))
                    .unwrap_or(0.0);
                let bonus = resume_skills
                    .map(|skills| title_rule_bonus(skills, &job.job_title))
                    .unwrap_or(0.0);
                let score =
                    (W_SEMANTIC * semantic_score + W_OVERLAP * overlap + bonus).clamp(0.0, 1.0);

                (
                    pos,
                    MatchCandidate {
                        job_id: job.job_id.clone(),
                        job_title: job.job_title.clone(),
                        company: job.company.clone(),
                        score,
                        semantic_score,
                        skill_overlap: overlap,
                        rule_bonus: bonus,
                        why_match: vec![],
                        skill_gaps: vec![],
                        skills: job.skills.clone(),
                        description: job.description.clone(),
                    },
                )
            })
            .collect();

        // Final ranking: fused score desc, semantic desc, catalog position asc.
        candidates.sort_by(|(pos_a, a), (pos_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.semantic_score
                        .partial_cmp(&a.semantic_score)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(pos_a.cmp(pos_b))
        });
        candidates.truncate(top_k);

        Ok(candidates.into_iter().map(|(_, c)| c).collect())
    }
}

/// Deterministic business rule: a small bounded bonus when any resume skill
/// token appears in the job title.
fn title_rule_bonus(resume_skills: &BTreeSet<String>, job_title: &str) -> f32 {
    let title = job_title.to_lowercase();
    if resume_skills.iter().any(|skill| title.contains(skill)) {
        TITLE_MATCH_BONUS
    } else {
        0.0
    }
}
