// All LLM prompt constants for the explanation pipeline.
// Reuses the JSON-only fragment from llm_client::prompts.

/// System prompt for match explanation — enforces JSON-only output.
pub const EXPLAIN_SYSTEM: &str =
    "You are a technical recruitment assistant analyzing how well a candidate \
    matches a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Explanation prompt template. Replace `{resume_text}`, `{job_title}`,
/// `{company}`, `{skills}`, `{description}`, `{score}` before sending.
pub const EXPLAIN_PROMPT_TEMPLATE: &str = r#"Analyze the candidate's resume against the job posting below. Provide concrete match reasons and skill gaps.

Candidate Resume:
{resume_text}

Job Information:
Title: {job_title}
Company: {company}
Required Skills: {skills}
Description: {description}
Semantic Match Score (0-1): {score}

Return a JSON object with this EXACT schema (no extra fields):
{
  "why_match": ["reason 1", "reason 2", "reason 3"],
  "skill_gaps": ["missing skill 1", "missing skill 2"]
}

Rules:
- why_match: 2-4 short, specific justifications grounded in the resume and job text
- skill_gaps: required skills the resume does NOT demonstrate; empty array if none
- Do NOT invent resume facts or job requirements"#;
