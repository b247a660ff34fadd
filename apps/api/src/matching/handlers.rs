//! Axum route handlers for the Match API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::skills::extract_skills;
use crate::models::job::MatchCandidate;
use crate::state::AppState;

const DEFAULT_TOP_K: usize = 10;
const MAX_TOP_K: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchCandidate>,
}

fn validate_top_k(top_k: Option<usize>) -> Result<usize, AppError> {
    let top_k = top_k.unwrap_or(DEFAULT_TOP_K);
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }
    Ok(top_k)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Matches raw resume text against the catalog: embed → search → hybrid
/// re-rank → best-effort enrichment. Skills come from the keyword scan.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text cannot be empty".to_string(),
        ));
    }
    let top_k = validate_top_k(request.top_k)?;

    let skills = extract_skills(&request.resume_text);
    let ranked = state
        .engine
        .semantic_match(&request.resume_text, top_k, Some(&skills))
        .await?;
    let matches = state.explainer.explain(&request.resume_text, ranked).await;

    Ok(Json(MatchResponse { matches }))
}

/// POST /api/v1/match/upload
///
/// Multipart variant: `file` part carries the document, optional `top_k`
/// text part. Runs extraction → structuring → match → enrichment.
pub async fn handle_match_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let mut document: Option<(String, bytes::Bytes)> = None;
    let mut top_k: Option<usize> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("file part is missing a filename".to_string())
                    })?
                    .to_string();
                if !crate::resume::allowed_extension(&filename) {
                    return Err(AppError::Validation(format!(
                        "Unsupported file type: {filename}. Accepted: .pdf, .docx, .doc"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {e}"))
                })?;
                document = Some((filename, bytes));
            }
            Some("top_k") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read top_k field: {e}"))
                })?;
                let parsed = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| AppError::Validation("top_k must be an integer".to_string()))?;
                top_k = Some(parsed);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        document.ok_or_else(|| AppError::Validation("Missing file part".to_string()))?;
    let top_k = validate_top_k(top_k)?;

    let parsed = state.resume_parser.parse(&bytes, &filename).await?;
    let ranked = state
        .engine
        .semantic_match(&parsed.text, top_k, Some(&parsed.skills))
        .await?;
    let matches = state.explainer.explain(&parsed.text, ranked).await;

    Ok(Json(MatchResponse { matches }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_defaults_to_ten() {
        assert_eq!(validate_top_k(None).unwrap(), 10);
    }

    #[test]
    fn test_top_k_bounds() {
        assert!(validate_top_k(Some(0)).is_err());
        assert!(validate_top_k(Some(51)).is_err());
        assert_eq!(validate_top_k(Some(1)).unwrap(), 1);
        assert_eq!(validate_top_k(Some(50)).unwrap(), 50);
    }
}
