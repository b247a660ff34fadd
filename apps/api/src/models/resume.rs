use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Structured resume fields extracted by the LLM structuring pass.
/// Every field is best-effort — the structuring call may fail or return a
/// partial object, and downstream matching must work either way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredResume {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    #[serde(default)]
    pub years_experience: Option<f32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// The matching engine's view of an uploaded resume.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedResume {
    /// Assembled embedding input. Deterministic field order so identical
    /// structured output always produces the same embedding.
    pub text: String,
    /// Lowercase skill tokens used by the hybrid scorer.
    pub skills: BTreeSet<String>,
    /// Raw structured extraction, opaque to the engine except `skills`.
    pub structured: Option<StructuredResume>,
}

impl ParsedResume {
    /// Builds the canonical embedding text: structured fields in fixed order,
    /// then the full raw text.
    pub fn assemble_text(structured: &StructuredResume, raw_text: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(name) = &structured.name {
            parts.push(format!("Name: {name}"));
        }
        if let Some(email) = &structured.email {
            parts.push(format!("Email: {email}"));
        }
        if let Some(title) = &structured.current_title {
            parts.push(format!("Current Title: {title}"));
        }
        if let Some(years) = structured.years_experience {
            parts.push(format!("Total Experience: {years} years"));
        }
        if !structured.skills.is_empty() {
            parts.push(format!("Skills: {}", structured.skills.join(", ")));
        }
        if let Some(summary) = &structured.summary {
            parts.push(format!("Summary: {summary}"));
        }
        parts.push(raw_text.to_string());
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_text_fixed_field_order() {
        let structured = StructuredResume {
            name: Some("Ada".to_string()),
            email: None,
            current_title: Some("Platform Engineer".to_string()),
            years_experience: Some(4.0),
            skills: vec!["rust".to_string(), "docker".to_string()],
            summary: Some("Builds backends.".to_string()),
        };

        let text = ParsedResume::assemble_text(&structured, "raw resume body");
        assert_eq!(
            text,
            "Name: Ada\nCurrent Title: Platform Engineer\nTotal Experience: 4 years\nSkills: rust, docker\nSummary: Builds backends.\nraw resume body"
        );
    }

    #[test]
    fn test_assemble_text_empty_structure_is_raw_text() {
        let text = ParsedResume::assemble_text(&StructuredResume::default(), "just the text");
        assert_eq!(text, "just the text");
    }
}
