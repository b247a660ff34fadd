//! Explanation Enrichment Pipeline — attaches `why_match` / `skill_gaps` to
//! ranked candidates via per-candidate LLM calls.
//!
//! Calls fan out with bounded concurrency (semaphore, independent of top_k)
//! and a per-call timeout. Results are reassembled by input position, never
//! by completion order. Every per-candidate failure — transport error after
//! the client's bounded retries, timeout, or malformed output — degrades to
//! placeholder text; enrichment never fails the overall match request.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::llm_client::{strip_json_fences, GenerativeProvider};
use crate::models::job::MatchCandidate;

pub mod prompts;

use prompts::{EXPLAIN_PROMPT_TEMPLATE, EXPLAIN_SYSTEM};

/// Substituted when a per-candidate call or parse fails.
pub const PLACEHOLDER_WHY_MATCH: &str = "explanation unavailable";

/// Per-call wall clock budget, covering the client's internal retries.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
struct Explanation {
    why_match: Vec<String>,
    skill_gaps: Vec<String>,
}

impl Explanation {
    fn placeholder() -> Self {
        Explanation {
            why_match: vec![PLACEHOLDER_WHY_MATCH.to_string()],
            skill_gaps: vec![],
        }
    }
}

pub struct ExplainPipeline {
    provider: Arc<dyn GenerativeProvider>,
    /// Max in-flight LLM calls per request.
    concurrency: usize,
}

impl ExplainPipeline {
    pub fn new(provider: Arc<dyn GenerativeProvider>, concurrency: usize) -> Self {
        ExplainPipeline {
            provider,
            concurrency: concurrency.max(1),
        }
    }

    /// Enriches candidates in place, preserving input order. Infallible by
    /// design: failures degrade per candidate.
    pub async fn explain(
        &self,
        resume_text: &str,
        mut candidates: Vec<MatchCandidate>,
    ) -> Vec<MatchCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(usize, Explanation)> = JoinSet::new();

        for (idx, candidate) in candidates.iter().enumerate() {
            let prompt = build_prompt(resume_text, candidate);
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let job_id = candidate.job_id.clone();

            tasks.spawn(async move {
                // Closed only if the pipeline is dropped mid-request, in
                // which case the task result is discarded anyway.
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, Explanation::placeholder()),
                };

                let explanation =
                    match tokio::time::timeout(CALL_TIMEOUT, provider.generate(&prompt, EXPLAIN_SYSTEM))
                        .await
                    {
                        Ok(Ok(text)) => parse_explanation(&text).unwrap_or_else(|| {
                            warn!("Unparseable explanation for job {job_id}; using placeholder");
                            Explanation::placeholder()
                        }),
                        Ok(Err(e)) => {
                            warn!("Explanation call failed for job {job_id}: {e}");
                            Explanation::placeholder()
                        }
                        Err(_) => {
                            warn!("Explanation call timed out for job {job_id}");
                            Explanation::placeholder()
                        }
                    };

                (idx, explanation)
            });
        }

        // Reassemble by original index regardless of completion order.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, explanation)) => {
                    candidates[idx].why_match = explanation.why_match;
                    candidates[idx].skill_gaps = explanation.skill_gaps;
                }
                Err(e) => warn!("Explanation task panicked: {e}"),
            }
        }

        // A panicked task leaves its candidate unenriched; degrade it too.
        for candidate in &mut candidates {
            if candidate.why_match.is_empty() {
                let placeholder = Explanation::placeholder();
                candidate.why_match = placeholder.why_match;
                candidate.skill_gaps = placeholder.skill_gaps;
            }
        }

        candidates
    }
}

/// Deterministic per-candidate prompt. The semantic score is formatted to two
/// decimals so identical inputs always produce identical prompts.
fn build_prompt(resume_text: &str, candidate: &MatchCandidate) -> String {
    EXPLAIN_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{job_title}", &candidate.job_title)
        .replace("{company}", &candidate.company)
        .replace("{skills}", &candidate.skills.join(", "))
        .replace("{description}", &candidate.description)
        .replace("{score}", &format!("{:.2}", candidate.semantic_score))
}

/// Best-effort parse of the model's JSON output. Scalars where lists are
/// expected are coerced to single-element lists; anything unparseable
/// returns None so the caller can substitute the placeholder.
fn parse_explanation(content: &str) -> Option<Explanation> {
    let value: Value = serde_json::from_str(strip_json_fences(content)).ok()?;
    let obj = value.as_object()?;

    Some(Explanation {
        why_match: coerce_string_list(obj.get("why_match")),
        skill_gaps: coerce_string_list(obj.get("skill_gaps")),
    })
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(other) => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::llm_client::LlmError;

    fn candidate(id: &str, title: &str) -> MatchCandidate {
        MatchCandidate {
            job_id: id.to_string(),
            job_title: title.to_string(),
            company: "Acme".to_string(),
            score: 0.8,
            semantic_score: 0.75,
            skill_overlap: 0.5,
            rule_bonus: 0.0,
            why_match: vec![],
            skill_gaps: vec![],
            skills: vec!["react".to_string()],
            description: "Build things.".to_string(),
        }
    }

    /// Finishes later candidates first: candidate at index i sleeps
    /// (count - i) * 10ms, so completion order is the reverse of input order.
    struct ReverseOrderProvider {
        count: usize,
    }

    #[async_trait]
    impl GenerativeProvider for ReverseOrderProvider {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            // The job title is embedded in the prompt as "Title: job-N".
            let n: usize = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Title: job-"))
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(((self.count - n) * 10) as u64)).await;
            Ok(format!(
                r#"{{"why_match": ["reason for job-{n}"], "skill_gaps": []}}"#
            ))
        }
    }

    struct AlwaysFailProvider;

    #[async_trait]
    impl GenerativeProvider for AlwaysFailProvider {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    struct MalformedProvider;

    #[async_trait]
    impl GenerativeProvider for MalformedProvider {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok("Sure! Here are some thoughts about this match...".to_string())
        }
    }

    /// Tracks the maximum number of concurrently running calls.
    struct ConcurrencyProbe {
        current: AtomicUsize,
        max_seen: AtomicUsize,
    }

    #[async_trait]
    impl GenerativeProvider for ConcurrencyProbe {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(r#"{"why_match": ["ok"], "skill_gaps": []}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_enrichment_preserves_input_order() {
        let count = 4;
        let pipeline = ExplainPipeline::new(Arc::new(ReverseOrderProvider { count }), count);
        let candidates: Vec<_> = (0..count)
            .map(|i| candidate(&format!("j{i}"), &format!("job-{i}")))
            .collect();

        let enriched = pipeline.explain("resume", candidates).await;

        for (i, c) in enriched.iter().enumerate() {
            assert_eq!(c.job_id, format!("j{i}"));
            assert_eq!(c.why_match, vec![format!("reason for job-{i}")]);
        }
    }

    #[tokio::test]
    async fn test_all_calls_failing_degrades_to_placeholders() {
        let pipeline = ExplainPipeline::new(Arc::new(AlwaysFailProvider), 2);
        let candidates = vec![candidate("a", "A"), candidate("b", "B")];

        let enriched = pipeline.explain("resume", candidates).await;

        assert_eq!(enriched.len(), 2);
        for c in &enriched {
            assert_eq!(c.why_match, vec![PLACEHOLDER_WHY_MATCH.to_string()]);
            assert!(c.skill_gaps.is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_output_degrades_to_placeholder() {
        let pipeline = ExplainPipeline::new(Arc::new(MalformedProvider), 2);
        let enriched = pipeline.explain("resume", vec![candidate("a", "A")]).await;
        assert_eq!(enriched[0].why_match, vec![PLACEHOLDER_WHY_MATCH.to_string()]);
    }

    #[tokio::test]
    async fn test_concurrency_stays_within_the_bound() {
        let probe = Arc::new(ConcurrencyProbe {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        });
        let pipeline = ExplainPipeline::new(probe.clone(), 2);
        let candidates: Vec<_> = (0..8).map(|i| candidate(&format!("j{i}"), "T")).collect();

        let enriched = pipeline.explain("resume", candidates).await;

        assert_eq!(enriched.len(), 8);
        assert!(probe.max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_a_no_op() {
        let pipeline = ExplainPipeline::new(Arc::new(AlwaysFailProvider), 2);
        let enriched = pipeline.explain("resume", vec![]).await;
        assert!(enriched.is_empty());
    }

    #[test]
    fn test_parse_explanation_happy_path() {
        let parsed = parse_explanation(
            r#"{"why_match": ["strong React overlap"], "skill_gaps": ["Solidity"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.why_match, vec!["strong React overlap"]);
        assert_eq!(parsed.skill_gaps, vec!["Solidity"]);
    }

    #[test]
    fn test_parse_explanation_strips_code_fences() {
        let parsed = parse_explanation(
            "```json\n{\"why_match\": [\"fenced\"], \"skill_gaps\": []}\n```",
        )
        .unwrap();
        assert_eq!(parsed.why_match, vec!["fenced"]);
    }

    #[test]
    fn test_parse_explanation_coerces_scalars_to_lists() {
        let parsed =
            parse_explanation(r#"{"why_match": "single reason", "skill_gaps": 42}"#).unwrap();
        assert_eq!(parsed.why_match, vec!["single reason"]);
        assert_eq!(parsed.skill_gaps, vec!["42"]);
    }

    #[test]
    fn test_parse_explanation_missing_fields_are_empty() {
        let parsed = parse_explanation(r#"{}"#).unwrap();
        assert!(parsed.why_match.is_empty());
        assert!(parsed.skill_gaps.is_empty());
    }

    #[test]
    fn test_parse_explanation_rejects_non_json() {
        assert!(parse_explanation("not json at all").is_none());
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let c = candidate("a", "Full-stack Web3 Engineer");
        let p1 = build_prompt("resume text", &c);
        let p2 = build_prompt("resume text", &c);
        assert_eq!(p1, p2);
        assert!(p1.contains("Semantic Match Score (0-1): 0.75"));
        assert!(p1.contains("Title: Full-stack Web3 Engineer"));
    }
}
