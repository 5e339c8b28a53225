//! Axum route handlers for the Evaluation API.

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::evaluation::models::{EvaluationReport, InsightSection};
use crate::evaluation::pipeline::{evaluate, EvaluationOptions, ResumeUpload};
use crate::state::AppState;

/// POST /api/v1/evaluations
///
/// multipart/form-data:
/// - `job_description`: text, required
/// - `resume`: file (PDF, DOCX or TXT), required
/// - `sections`: optional comma-separated insight sections; defaults to all
pub async fn handle_evaluate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EvaluationReport>, AppError> {
    let mut job_description = String::new();
    let mut upload: Option<ResumeUpload> = None;
    let mut sections = InsightSection::ALL.to_vec();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "job_description" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable job_description: {e}")))?;
            }
            "resume" => {
                let file_name = field.file_name().map(str::to_string);
                let media_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable resume upload: {e}")))?;
                // Browsers send an empty part when no file was chosen.
                if file_name.as_deref().unwrap_or_default().is_empty() && bytes.is_empty() {
                    continue;
                }
                upload = Some(ResumeUpload {
                    file_name,
                    media_type,
                    bytes,
                });
            }
            "sections" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable sections: {e}")))?;
                sections = InsightSection::parse_list(&raw)?;
            }
            _ => {}
        }
    }

    let options = EvaluationOptions {
        sections,
        processing_delay: Duration::from_millis(state.config.processing_delay_ms),
    };

    let report = evaluate(state.llm.as_ref(), &options, &job_description, upload).await?;
    Ok(Json(report))
}
