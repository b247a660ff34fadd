//! Skill extraction and overlap scoring.
//!
//! Extraction is a deterministic keyword scan against a known-skill
//! inventory. Good enough to drive the overlap signal; a model-based
//! extractor can replace it behind the same function signature.

use std::collections::BTreeSet;

/// Known skill tokens matched as lowercase substrings of the resume text.
pub const KNOWN_SKILLS: &[&str] = &[
    "react",
    "next.js",
    "nextjs",
    "node.js",
    "node",
    "typescript",
    "python",
    "pytorch",
    "tensorflow",
    "solidity",
    "web3",
    "rust",
    "docker",
    "kubernetes",
    "aws",
    "gcp",
];

/// Scans the text for known skill tokens. Returned tokens are lowercase.
pub fn extract_skills(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    KNOWN_SKILLS
        .iter()
        .filter(|skill| lowered.contains(**skill))
        .map(|skill| skill.to_string())
        .collect()
}

/// Fraction of the job's required skills covered by the resume:
/// `|resume ∩ job| / max(1, |job|)`. Rewards covering a job's requirements
/// rather than penalizing a broad resume. Comparison is lowercase.
pub fn skill_overlap(resume_skills: &BTreeSet<String>, job_skills: &[String]) -> f32 {
    if resume_skills.is_empty() || job_skills.is_empty() {
        return 0.0;
    }

    let job_tokens: BTreeSet<String> = job_skills.iter().map(|s| s.to_lowercase()).collect();
    let covered = job_tokens
        .iter()
        .filter(|s| resume_skills.contains(*s))
        .count();

    covered as f32 / job_tokens.len().max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_skills_finds_known_tokens_case_insensitively() {
        let found = extract_skills("Senior React developer, 3 years Next.js and Docker");
        assert!(found.contains("react"));
        assert!(found.contains("next.js"));
        assert!(found.contains("docker"));
        assert!(!found.contains("pytorch"));
    }

    #[test]
    fn test_extract_skills_empty_text() {
        assert!(extract_skills("").is_empty());
    }

    #[test]
    fn test_overlap_is_one_when_resume_covers_all_job_skills() {
        let resume = skills(&["react", "web3", "docker", "rust"]);
        let job = vec!["React".to_string(), "Web3".to_string()];
        assert_eq!(skill_overlap(&resume, &job), 1.0);
    }

    #[test]
    fn test_overlap_is_zero_when_disjoint() {
        let resume = skills(&["python", "pytorch"]);
        let job = vec!["react".to_string(), "web3".to_string()];
        assert_eq!(skill_overlap(&resume, &job), 0.0);
    }

    #[test]
    fn test_overlap_is_fraction_of_job_skills() {
        let resume = skills(&["react"]);
        let job = vec![
            "react".to_string(),
            "web3".to_string(),
            "solidity".to_string(),
            "typescript".to_string(),
        ];
        assert_eq!(skill_overlap(&resume, &job), 0.25);
    }

    #[test]
    fn test_overlap_zero_when_either_side_empty() {
        assert_eq!(skill_overlap(&BTreeSet::new(), &["react".to_string()]), 0.0);
        assert_eq!(skill_overlap(&skills(&["react"]), &[]), 0.0);
    }

    #[test]
    fn test_overlap_dedupes_job_skills() {
        let resume = skills(&["react"]);
        let job = vec!["React".to_string(), "react".to_string()];
        assert_eq!(skill_overlap(&resume, &job), 1.0);
    }
}
