//! Response parser: turns the model's free-text reply into an `EvaluationResult`.
//!
//! The model is asked for `{"JD Match": "NN%", "MissingKeywords": [...], "Profile Summary": "..."}`
//! but nothing binds it to that shape, so every deviation is a typed error, never a panic.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::evaluation::models::EvaluationResult;

const MATCH_KEY: &str = "JD Match";
const KEYWORDS_KEY: &str = "MissingKeywords";
const SUMMARY_KEY: &str = "Profile Summary";

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("The model's reply is not valid JSON: {reason}")]
    Unparseable { reason: String, raw_reply: String },

    #[error("The model returned an invalid match percentage: {0:?}")]
    InvalidMatchValue(String),
}

/// Removes ASCII control characters (0x00–0x1F and 0x7F). Models occasionally emit
/// raw newlines or NULs inside JSON strings, which strict parsing rejects.
pub fn clean_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(*c, '\u{0}'..='\u{1f}' | '\u{7f}'))
        .collect()
}

pub fn parse_reply(raw: &str) -> Result<EvaluationResult, ParseError> {
    let cleaned = clean_control_chars(raw);
    let json = strip_json_fences(&cleaned);

    let value: Value = serde_json::from_str(json).map_err(|e| ParseError::Unparseable {
        reason: e.to_string(),
        raw_reply: raw.to_string(),
    })?;
    let object = value.as_object().ok_or_else(|| ParseError::Unparseable {
        reason: "expected a JSON object".to_string(),
        raw_reply: raw.to_string(),
    })?;

    Ok(EvaluationResult {
        match_percentage: match_percentage(object)?,
        missing_keywords: missing_keywords(object),
        profile_summary: object
            .get(SUMMARY_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Accepts `"82%"`, `" 82 "`, `"82"` or a bare integer; anything outside 0–100 is invalid.
fn match_percentage(object: &Map<String, Value>) -> Result<u8, ParseError> {
    let value = object
        .get(MATCH_KEY)
        .ok_or_else(|| ParseError::InvalidMatchValue(format!("missing \"{MATCH_KEY}\"")))?;

    let parsed = match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            digits.parse::<u8>().ok()
        }
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    };

    parsed
        .filter(|p| *p <= 100)
        .ok_or_else(|| ParseError::InvalidMatchValue(value.to_string()))
}

fn missing_keywords(object: &Map<String, Value>) -> Vec<String> {
    object
        .get(KEYWORDS_KEY)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
