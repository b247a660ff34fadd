use serde::{Deserialize, Serialize};

/// A single job posting from the catalog. Immutable once loaded; positionally
/// aligned with one vector in the index.
///
/// Identity is `job_id`. Duplicate ids in the catalog file are tolerated but
/// the first occurrence wins for id lookups (later duplicates are logged and
/// kept only as positional entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl JobRecord {
    /// Deterministic corpus text for embedding. Field order and labels are
    /// fixed and must stay identical between index build and any re-embed,
    /// otherwise similarity scores silently drift.
    pub fn corpus_text(&self) -> String {
        format!(
            "{}\nCompany: {}\nRequirements: {}\nSkills: {}\nDescription: {}",
            self.job_title,
            self.company,
            self.requirements,
            self.skills.join(", "),
            self.description
        )
    }
}

/// A ranked match produced per query. `why_match` / `skill_gaps` are empty
/// until the enrichment pipeline fills them (placeholder text on failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    /// Fused score in [0, 1]: w_sem * semantic + w_overlap * overlap + bonus.
    pub score: f32,
    /// Cosine similarity of the normalized query and job vectors.
    pub semantic_score: f32,
    /// Fraction of the job's required skills covered by the resume.
    pub skill_overlap: f32,
    /// Bounded additive adjustment from deterministic business rules.
    pub rule_bonus: f32,
    #[serde(default)]
    pub why_match: Vec<String>,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    /// Job skills carried for prompt construction; not part of the response.
    #[serde(skip)]
    pub skills: Vec<String>,
    /// Job description carried for prompt construction; not part of the response.
    #[serde(skip)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_text_field_order_is_fixed() {
        let job = JobRecord {
            job_id: "j1".to_string(),
            job_title: "Senior ML Engineer".to_string(),
            company: "AI Labs".to_string(),
            description: "Train and ship models.".to_string(),
            requirements: "3+ years PyTorch".to_string(),
            skills: vec!["python".to_string(), "pytorch".to_string()],
        };

        assert_eq!(
            job.corpus_text(),
            "Senior ML Engineer\nCompany: AI Labs\nRequirements: 3+ years PyTorch\nSkills: python, pytorch\nDescription: Train and ship models."
        );
    }

    #[test]
    fn test_job_record_deserializes_with_missing_optional_fields() {
        let job: JobRecord = serde_json::from_str(
            r#"{"job_id": "j1", "job_title": "Backend Engineer", "company": "Acme"}"#,
        )
        .unwrap();
        assert!(job.skills.is_empty());
        assert!(job.description.is_empty());
    }
}
