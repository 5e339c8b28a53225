use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::prompts;
use crate::extraction::DocumentFormat;

pub const MISSING_JOB_DESCRIPTION: &str =
    "Please provide a job description before uploading your resume.";

/// Resume text paired with the job description it is judged against.
/// Both are non-blank by construction.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    resume_text: String,
    job_description: String,
}

impl EvaluationRequest {
    pub fn new(resume_text: String, job_description: String) -> Result<Self, AppError> {
        if job_description.trim().is_empty() {
            return Err(AppError::Validation(MISSING_JOB_DESCRIPTION.to_string()));
        }
        if resume_text.trim().is_empty() {
            return Err(AppError::Validation("resume text cannot be empty".to_string()));
        }
        Ok(Self {
            resume_text,
            job_description,
        })
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }
}

/// Structured answer to the match prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 0 – 100
    pub match_percentage: u8,
    pub missing_keywords: Vec<String>,
    pub profile_summary: String,
}

/// The two slices of the match donut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub matched: u8,
    pub gap: u8,
}

impl From<&EvaluationResult> for ScoreBreakdown {
    fn from(result: &EvaluationResult) -> Self {
        let matched = result.match_percentage.min(100);
        ScoreBreakdown {
            matched,
            gap: 100 - matched,
        }
    }
}

/// Free-text sections answered by one extra LLM call each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSection {
    TenureAnalysis,
    MissingKeywords,
    SkillsMatch,
    ProfileSummary,
    GrammarFormatting,
    ToneLanguage,
}

impl InsightSection {
    /// Display order of the report.
    pub const ALL: [InsightSection; 6] = [
        InsightSection::TenureAnalysis,
        InsightSection::MissingKeywords,
        InsightSection::SkillsMatch,
        InsightSection::ProfileSummary,
        InsightSection::GrammarFormatting,
        InsightSection::ToneLanguage,
    ];

    pub fn title(self) -> &'static str {
        match self {
            InsightSection::TenureAnalysis => "Tenure Analysis",
            InsightSection::MissingKeywords => "Missing Keywords",
            InsightSection::SkillsMatch => "Skills Match Analysis",
            InsightSection::ProfileSummary => "Profile Summary",
            InsightSection::GrammarFormatting => "Grammar and Formatting Check",
            InsightSection::ToneLanguage => "Tone and Language",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            InsightSection::TenureAnalysis => prompts::TENURE_ANALYSIS,
            InsightSection::MissingKeywords => prompts::MISSING_KEYWORDS,
            InsightSection::SkillsMatch => prompts::SKILLS_MATCH,
            InsightSection::ProfileSummary => prompts::PROFILE_SUMMARY,
            InsightSection::GrammarFormatting => prompts::GRAMMAR_FORMATTING,
            InsightSection::ToneLanguage => prompts::TONE_LANGUAGE,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            InsightSection::TenureAnalysis => "tenure_analysis",
            InsightSection::MissingKeywords => "missing_keywords",
            InsightSection::SkillsMatch => "skills_match",
            InsightSection::ProfileSummary => "profile_summary",
            InsightSection::GrammarFormatting => "grammar_formatting",
            InsightSection::ToneLanguage => "tone_language",
        }
    }

    /// Parses a comma-separated selection such as `"tenure_analysis, tone_language"`.
    /// Order follows `ALL`; duplicates collapse. A blank list selects nothing.
    pub fn parse_list(raw: &str) -> Result<Vec<InsightSection>, AppError> {
        let mut requested = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            requested.push(name.parse::<InsightSection>()?);
        }
        Ok(InsightSection::ALL
            .into_iter()
            .filter(|s| requested.contains(s))
            .collect())
    }
}

impl fmt::Display for InsightSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightSection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsightSection::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown insight section '{s}'")))
    }
}

/// Opaque model text for one section. A failed call is recorded as `"Error: …"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuxiliaryInsight {
    pub section: InsightSection,
    pub title: &'static str,
    pub content: String,
    pub failed: bool,
}

/// Everything returned for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub evaluation_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub resume_format: DocumentFormat,
    pub result: EvaluationResult,
    pub score: ScoreBreakdown,
    pub insights: Vec<AuxiliaryInsight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_blank_job_description() {
        let err = EvaluationRequest::new("resume".into(), "  \n".into()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MISSING_JOB_DESCRIPTION));
    }

    #[test]
    fn test_request_rejects_blank_resume() {
        assert!(EvaluationRequest::new(" ".into(), "JD".into()).is_err());
    }

    #[test]
    fn test_score_breakdown_sums_to_100() {
        let result = EvaluationResult {
            match_percentage: 82,
            ..Default::default()
        };
        let score = ScoreBreakdown::from(&result);
        assert_eq!(score, ScoreBreakdown { matched: 82, gap: 18 });
    }

    #[test]
    fn test_section_list_parsing() {
        let sections = InsightSection::parse_list("tone_language, TENURE_ANALYSIS,tone_language").unwrap();
        assert_eq!(
            sections,
            vec![InsightSection::TenureAnalysis, InsightSection::ToneLanguage]
        );
        assert!(InsightSection::parse_list("").unwrap().is_empty());
        assert!(InsightSection::parse_list("tenure_analysis,horoscope").is_err());
    }

    #[test]
    fn test_section_serde_names_match_display() {
        for section in InsightSection::ALL {
            let json = serde_json::to_value(section).unwrap();
            assert_eq!(json, section.to_string());
        }
    }
}
