//! Analysis pipeline: prompt → remote model → parsed outcome.

use tracing::{info, warn};

use crate::analysis::prompts::build_ats_prompt;
use crate::analysis::response::{parse_analysis_reply, AnalysisResult, ReplyError};
use crate::llm_client::{LlmError, TextGenerator};

/// Inputs to one analysis. Neither string is validated here.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_description: String,
}

/// Result of one analysis run once the model has replied.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Analyzed(AnalysisResult),
    /// The model answered, but not in the agreed shape. `raw_reply` is kept for display.
    Unparseable { error: ReplyError, raw_reply: String },
}

/// Runs one analysis: exactly one call to the model, no retries.
/// Transport and authentication faults come back as `LlmError`.
pub async fn run_analysis(
    llm: &dyn TextGenerator,
    request: &AnalysisRequest,
) -> Result<AnalysisOutcome, LlmError> {
    let prompt = build_ats_prompt(&request.resume_text, &request.job_description);
    info!(
        "Requesting ATS analysis from {} (resume: {} chars, jd: {} chars)",
        llm.model(),
        request.resume_text.len(),
        request.job_description.len()
    );

    let raw_reply = llm.generate(&prompt).await?;

    match parse_analysis_reply(&raw_reply) {
        Ok(result) => {
            info!(
                "Analysis complete: {}% match, {} missing keywords",
                result.match_percent,
                result.missing_keywords.len()
            );
            Ok(AnalysisOutcome::Analyzed(result))
        }
        Err(error) => {
            warn!("Could not parse model reply ({}): {error}", error.kind());
            Ok(AnalysisOutcome::Unparseable { error, raw_reply })
        }
    }
}
