//! Reply parsing: turns the model's loosely formatted text into a validated `AnalysisResult`.
//!
//! Wire shape expected from the model:
//! `{"JD Match":"82%","MissingKeywords":["Docker"],"Profile Summary":"..."}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

const FENCE: &str = "```";

pub const JD_MATCH_FIELD: &str = "JD Match";
pub const MISSING_KEYWORDS_FIELD: &str = "MissingKeywords";
pub const PROFILE_SUMMARY_FIELD: &str = "Profile Summary";

/// Validated analysis of one résumé against one job description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// 0 – 100
    pub match_percent: u8,
    pub missing_keywords: Vec<String>,
    pub profile_summary: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplyError {
    #[error("reply is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("reply JSON has an unexpected shape: {0}")]
    UnexpectedShape(String),

    #[error("reply is missing the \"{0}\" field")]
    MissingField(&'static str),

    #[error("\"JD Match\" is not a whole percentage: {0:?}")]
    InvalidPercentage(String),

    #[error("\"JD Match\" is outside 0-100: {0}")]
    PercentageOutOfRange(i64),
}

impl ReplyError {
    /// Stable identifier for API clients and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyError::MalformedJson(_) => "malformed_json",
            ReplyError::UnexpectedShape(_) => "unexpected_shape",
            ReplyError::MissingField(_) => "missing_field",
            ReplyError::InvalidPercentage(_) => "invalid_percentage",
            ReplyError::PercentageOutOfRange(_) => "percentage_out_of_range",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(rename = "JD Match")]
    jd_match: Option<PercentValue>,
    #[serde(rename = "MissingKeywords")]
    missing_keywords: Option<Vec<String>>,
    #[serde(rename = "Profile Summary")]
    profile_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PercentValue {
    Text(String),
    Number(serde_json::Number),
}

/// Parses the model's raw reply. Code fences are stripped first.
pub fn parse_analysis_reply(raw: &str) -> Result<AnalysisResult, ReplyError> {
    let text = strip_code_fences(raw);

    let reply: RawReply = serde_json::from_str(text).map_err(|e| {
        if e.is_data() {
            ReplyError::UnexpectedShape(e.to_string())
        } else {
            ReplyError::MalformedJson(e.to_string())
        }
    })?;

    let jd_match = reply
        .jd_match
        .ok_or(ReplyError::MissingField(JD_MATCH_FIELD))?;
    let missing_keywords = reply
        .missing_keywords
        .ok_or(ReplyError::MissingField(MISSING_KEYWORDS_FIELD))?;
    let profile_summary = reply
        .profile_summary
        .ok_or(ReplyError::MissingField(PROFILE_SUMMARY_FIELD))?;

    Ok(AnalysisResult {
        match_percent: parse_percentage(&jd_match)?,
        missing_keywords: missing_keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        profile_summary: profile_summary.trim().to_string(),
    })
}

fn parse_percentage(value: &PercentValue) -> Result<u8, ReplyError> {
    let percent = match value {
        PercentValue::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .strip_suffix('%')
                .unwrap_or(trimmed)
                .trim()
                .parse::<i64>()
                .map_err(|_| ReplyError::InvalidPercentage(text.clone()))?
        }
        PercentValue::Number(number) => number
            .as_i64()
            .ok_or_else(|| ReplyError::InvalidPercentage(number.to_string()))?,
    };

    u8::try_from(percent)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(ReplyError::PercentageOutOfRange(percent))
}

/// Strips markdown code fences (```` ```json ... ``` ```` or ```` ``` ... ``` ````) from LLM output.
///
/// Only fences at the edges are removed, so fences quoted inside JSON strings survive.
/// When prose surrounds a fenced block, the first fenced block is returned.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        let body = trim_language_tag(rest).trim_end();
        return body.strip_suffix(FENCE).unwrap_or(body).trim();
    }

    if text.starts_with('{') {
        return text.strip_suffix(FENCE).unwrap_or(text).trim();
    }

    let Some(open) = text.find(FENCE) else {
        return text;
    };
    let body = trim_language_tag(&text[open + FENCE.len()..]);
    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

// Language tag on an opening fence, e.g. `json`.
fn trim_language_tag(after_fence: &str) -> &str {
    after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || "-_+".contains(c))
}
