//! Resume Structuring Service — turns an uploaded document into the
//! `ParsedResume` the matching engine consumes.
//!
//! Text extraction sits behind a trait so the PDF backend can be swapped or
//! extended (DOCX) without touching the pipeline. The LLM structuring pass is
//! strictly best-effort: any failure falls back to raw text plus keyword
//! skills, and the request proceeds.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, GenerativeProvider};
use crate::matching::skills::extract_skills;
use crate::models::resume::{ParsedResume, StructuredResume};

pub mod prompts;

use prompts::{STRUCTURE_PROMPT_TEMPLATE, STRUCTURE_SYSTEM};

/// Upload extensions accepted at the boundary.
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];

/// Returns true when the filename carries an accepted document extension.
pub fn allowed_extension(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn file_extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Document bytes → raw text seam.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, AppError>;
}

/// Default extractor. PDF goes through `pdf-extract`; Word documents are
/// accepted at the boundary but have no backend yet and surface a clear
/// extraction error.
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, AppError> {
        match file_extension(filename).as_deref() {
            Some("pdf") => pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| AppError::Extraction(format!("Failed to extract PDF text: {e}"))),
            Some("docx") | Some("doc") => Err(AppError::Extraction(
                "Word document extraction is not available yet; please upload a PDF".to_string(),
            )),
            _ => Err(AppError::Validation(format!(
                "Unsupported file type: {filename}"
            ))),
        }
    }
}

pub struct ResumeParser {
    extractor: Arc<dyn TextExtractor>,
    provider: Arc<dyn GenerativeProvider>,
}

impl ResumeParser {
    pub fn new(extractor: Arc<dyn TextExtractor>, provider: Arc<dyn GenerativeProvider>) -> Self {
        ResumeParser {
            extractor,
            provider,
        }
    }

    /// Full parse pipeline: extract text, attempt LLM structuring, assemble
    /// the canonical embedding text and the skill set.
    ///
    /// Fails only when no text can be extracted; structuring failure is
    /// logged and absorbed.
    pub async fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedResume, AppError> {
        let raw_text = self.extractor.extract(bytes, filename)?;
        if raw_text.trim().is_empty() {
            return Err(AppError::Extraction(
                "Document contains no extractable text".to_string(),
            ));
        }

        let structured = self.structure(&raw_text).await;

        let mut skills: BTreeSet<String> = extract_skills(&raw_text);
        if let Some(s) = &structured {
            skills.extend(s.skills.iter().map(|skill| skill.to_lowercase()));
        }

        let text = match &structured {
            Some(s) => ParsedResume::assemble_text(s, &raw_text),
            None => raw_text.clone(),
        };

        info!(
            "Parsed resume '{filename}': {} chars, {} skills, structured: {}",
            text.len(),
            skills.len(),
            structured.is_some()
        );

        Ok(ParsedResume {
            text,
            skills,
            structured,
        })
    }

    /// Best-effort structuring pass. Returns None on any provider or parse
    /// failure so the caller can fall back to raw text.
    async fn structure(&self, raw_text: &str) -> Option<StructuredResume> {
        let prompt = STRUCTURE_PROMPT_TEMPLATE.replace("{resume_text}", raw_text);
        match self.provider.generate(&prompt, STRUCTURE_SYSTEM).await {
            Ok(response) => match serde_json::from_str(strip_json_fences(&response)) {
                Ok(structured) => Some(structured),
                Err(e) => {
                    warn!("Resume structuring returned unparseable JSON: {e}");
                    None
                }
            },
            Err(e) => {
                warn!("Resume structuring call failed: {e}");
                None
            }
        }
    }
}
