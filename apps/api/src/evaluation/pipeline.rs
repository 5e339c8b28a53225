//! Evaluation pipeline: validate → extract → match prompt → parse → auxiliary insights.
//!
//! Calls are strictly sequential. The match call is fatal on failure; each auxiliary
//! call degrades to an `"Error: …"` insight instead of aborting the report.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::models::{
    AuxiliaryInsight, EvaluationReport, EvaluationRequest, InsightSection, ScoreBreakdown,
    MISSING_JOB_DESCRIPTION,
};
use crate::evaluation::parser::parse_reply;
use crate::evaluation::prompts::{fill_template, MATCH_EVALUATION};
use crate::extraction::{resolve_media_type, ExtractError, ResumeDocument};
use crate::llm_client::LlmClient;

/// A resume file as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub media_type: Option<String>,
    pub bytes: Bytes,
}

/// Per-submission knobs.
#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    pub sections: Vec<InsightSection>,
    /// Fixed pause before processing starts. Zero disables it.
    pub processing_delay: Duration,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            sections: InsightSection::ALL.to_vec(),
            processing_delay: Duration::ZERO,
        }
    }
}

/// Runs one submission end to end.
pub async fn evaluate(
    llm: &dyn LlmClient,
    options: &EvaluationOptions,
    job_description: &str,
    upload: Option<ResumeUpload>,
) -> Result<EvaluationReport, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(MISSING_JOB_DESCRIPTION.to_string()));
    }
    let upload = upload
        .ok_or_else(|| AppError::Validation("Please upload a resume file.".to_string()))?;

    let evaluation_id = Uuid::new_v4();
    let generated_at = Utc::now();

    let media_type = resolve_media_type(upload.media_type.as_deref(), upload.file_name.as_deref())
        .ok_or_else(|| {
            ExtractError::UnsupportedFormat(
                upload
                    .media_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })?;

    if !options.processing_delay.is_zero() {
        tokio::time::sleep(options.processing_delay).await;
    }

    let document = ResumeDocument::from_upload(upload.bytes, &media_type).await?;
    let resume_text = document.require_text()?;
    info!(
        %evaluation_id,
        "Extracted {} chars from {} resume ({} bytes)",
        resume_text.len(),
        document.source_format,
        document.raw_bytes.len()
    );

    let request = EvaluationRequest::new(resume_text.to_string(), job_description.to_string())?;

    let prompt = fill_template(
        MATCH_EVALUATION,
        &[
            ("text", request.resume_text()),
            ("job_description", request.job_description()),
        ],
    );
    let reply = llm.invoke(&prompt).await.map_err(|e| {
        error!(%evaluation_id, "Match evaluation call failed: {e}");
        e
    })?;

    let result = parse_reply(&reply).map_err(|e| {
        warn!(%evaluation_id, "Could not parse match reply: {e}");
        e
    })?;
    info!(
        %evaluation_id,
        "Match score {}% with {} missing keywords",
        result.match_percentage,
        result.missing_keywords.len()
    );

    let today = generated_at.format("%B %d, %Y").to_string();
    let mut insights = Vec::with_capacity(options.sections.len());
    for &section in &options.sections {
        insights.push(run_insight(llm, &request, section, &today, evaluation_id).await);
    }

    Ok(EvaluationReport {
        evaluation_id,
        generated_at,
        model: llm.model().to_string(),
        resume_format: document.source_format,
        score: ScoreBreakdown::from(&result),
        result,
        insights,
    })
}

async fn run_insight(
    llm: &dyn LlmClient,
    request: &EvaluationRequest,
    section: InsightSection,
    today: &str,
    evaluation_id: Uuid,
) -> AuxiliaryInsight {
    let prompt = fill_template(
        section.template(),
        &[
            ("text", request.resume_text()),
            ("job_description", request.job_description()),
            ("today", today),
        ],
    );

    let (content, failed) = match llm.invoke(&prompt).await {
        Ok(text) => (text, false),
        Err(e) => {
            warn!(%evaluation_id, "Insight '{section}' failed: {e}");
            (format!("Error: {e}"), true)
        }
    };

    AuxiliaryInsight {
        section,
        title: section.title(),
        content,
        failed,
    }
}
