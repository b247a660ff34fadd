// All LLM prompt constants for resume structuring.

/// System prompt for resume structuring — enforces JSON-only output.
pub const STRUCTURE_SYSTEM: &str =
    "You are an expert resume analyst. Extract structured candidate \
    information from raw resume text. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent information not present in the resume.";

/// Structuring prompt template. Replace `{resume_text}` before sending.
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"Extract structured information from the resume below.

Return a JSON object with this EXACT schema (use null for anything absent):
{
  "name": "Jane Doe",
  "email": "jane@example.com",
  "current_title": "Senior Backend Engineer",
  "years_experience": 5.5,
  "skills": ["rust", "docker", "aws"],
  "summary": "One or two sentences describing the candidate's profile."
}

Rules:
- skills: lowercase technology/tool tokens only, no soft skills
- years_experience: total professional years as a number, null if unclear
- summary: write it from the resume content; do not copy a headline verbatim

RESUME:
{resume_text}"#;
