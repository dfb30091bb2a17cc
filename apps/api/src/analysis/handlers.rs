//! Axum route handlers for the analysis page and the JSON API.

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::response::AnalysisResult;
use crate::analysis::service::{run_analysis, AnalysisOutcome, AnalysisRequest};
use crate::errors::AppError;
use crate::extraction::{extract_document_text, looks_like_pdf, PdfDocument};
use crate::render::report::MISSING_INPUTS_WARNING;
use crate::render::{render_page, PageView};
use crate::state::AppState;

pub const NOT_A_PDF_WARNING: &str = "Please upload your resume in PDF format.";
const UNREADABLE_RESUME_MESSAGE: &str =
    "Could not read the uploaded resume. Please upload a valid PDF.";

// ────────────────────────────────────────────────────────────────────────────
// Form / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Fields submitted by the analysis form.
#[derive(Debug, Default)]
pub struct AnalysisForm {
    pub job_description: String,
    pub resume: Option<UploadedResume>,
}

#[derive(Debug)]
pub struct UploadedResume {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl AnalysisForm {
    /// Both inputs, or `None` if either is absent.
    pub fn into_inputs(self) -> Option<(String, UploadedResume)> {
        if self.job_description.trim().is_empty() {
            return None;
        }
        self.resume.map(|resume| (self.job_description, resume))
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub request_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_index() -> Html<String> {
    Html(render_page("", &PageView::Empty))
}

/// POST /analyze
///
/// Form submission from the page. Every analysis failure is rendered in-page;
/// remote faults collapse into the generic parse-failure block.
pub async fn handle_analyze_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = match read_analysis_form(multipart).await {
        Ok(form) => form,
        Err(AppError::Validation(message)) => {
            warn!("Rejected analysis form: {message}");
            return Ok(Html(render_page("", &PageView::Error(&message))));
        }
        Err(e) => return Err(e),
    };
    let job_description = form.job_description.clone();

    let result = match form.into_inputs() {
        Some((jd, resume)) => Some(analyze_submission(&state, jd, resume).await),
        None => {
            warn!("Analysis submitted without both resume and job description");
            None
        }
    };

    Ok(Html(page_for_result(&job_description, result)?))
}

/// POST /api/v1/analyze
///
/// Same multipart form as the page, JSON in and out.
pub async fn handle_analyze_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = read_analysis_form(multipart).await?;
    let (jd, resume) = form
        .into_inputs()
        .ok_or_else(|| AppError::Validation(MISSING_INPUTS_WARNING.to_string()))?;

    match analyze_submission(&state, jd, resume).await? {
        AnalysisOutcome::Analyzed(result) => Ok(Json(AnalyzeResponse {
            request_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            model: state.llm.model().to_string(),
            result,
        })),
        AnalysisOutcome::Unparseable { error, raw_reply } => {
            Err(AppError::UnparseableReply { error, raw_reply })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// extract → prompt → model → parse, for one submission.
async fn analyze_submission(
    state: &AppState,
    job_description: String,
    resume: UploadedResume,
) -> Result<AnalysisOutcome, AppError> {
    let request_id = Uuid::new_v4();

    if !looks_like_pdf(resume.file_name.as_deref(), resume.content_type.as_deref()) {
        return Err(AppError::Validation(NOT_A_PDF_WARNING.to_string()));
    }

    info!(
        "Analysis {request_id}: extracting resume {:?} ({} bytes)",
        resume.file_name,
        resume.bytes.len()
    );
    let resume_text = extract_resume_text(resume.bytes).await?;

    let request = AnalysisRequest {
        resume_text,
        job_description,
    };
    let outcome = run_analysis(state.llm.as_ref(), &request).await?;
    info!(
        "Analysis {request_id}: finished ({})",
        match &outcome {
            AnalysisOutcome::Analyzed(_) => "parsed",
            AnalysisOutcome::Unparseable { .. } => "unparseable",
        }
    );
    Ok(outcome)
}

/// PDF parsing is CPU-bound; keep it off the async workers.
async fn extract_resume_text(bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || {
        let document = PdfDocument::from_bytes(&bytes)?;
        extract_document_text(&document)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("resume extraction task failed: {e}")))??;
    Ok(text)
}

/// Maps a submission result onto the page. `None` means inputs were missing.
fn page_for_result(
    job_description: &str,
    result: Option<Result<AnalysisOutcome, AppError>>,
) -> Result<String, AppError> {
    let Some(result) = result else {
        return Ok(render_page(
            job_description,
            &PageView::Warning(MISSING_INPUTS_WARNING),
        ));
    };

    let html = match result {
        Ok(AnalysisOutcome::Analyzed(result)) => {
            render_page(job_description, &PageView::Report(&result))
        }
        Ok(AnalysisOutcome::Unparseable { raw_reply, .. }) => render_page(
            job_description,
            &PageView::ParseFailure {
                raw_reply: &raw_reply,
            },
        ),
        Err(AppError::Llm(e)) => {
            error!("Analysis failed at the model call: {e}");
            render_page(job_description, &PageView::ParseFailure { raw_reply: "" })
        }
        Err(AppError::Validation(message)) => {
            render_page(job_description, &PageView::Warning(&message))
        }
        Err(AppError::Extraction(e)) => {
            warn!("Resume extraction failed: {e}");
            render_page(job_description, &PageView::Error(UNREADABLE_RESUME_MESSAGE))
        }
        Err(e) => return Err(e),
    };
    Ok(html)
}

/// Reads the multipart form. Unknown fields are ignored; an empty file part
/// (no file chosen) counts as no résumé.
async fn read_analysis_form(mut multipart: Multipart) -> Result<AnalysisForm, AppError> {
    let mut form = AnalysisForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_description") => {
                form.job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job description: {e}")))?;
            }
            Some("resume") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid resume upload: {e}")))?;
                if !bytes.is_empty() {
                    form.resume = Some(UploadedResume {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::response::ReplyError;
    use crate::config::Config;
    use crate::extraction::pdf::testing::text_pdf;
    use crate::llm_client::testing::StubGenerator;
    use crate::llm_client::LlmError;
    use crate::render::report::{NO_MISSING_KEYWORDS_MESSAGE, PARSE_FAILURE_MESSAGE};
    use crate::routes::build_router;

    const BOUNDARY: &str = "smart-ats-test-boundary";
    const WELL_FORMED: &str = r#"{"JD Match":"82%","MissingKeywords":["Docker","Kubernetes"],"Profile Summary":"Strong backend skills."}"#;

    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        content_type: Option<&'a str>,
        data: &'a [u8],
    }

    fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
        Part {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    fn file_part<'a>(file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
        Part {
            name: "resume",
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(file_name) = part.file_name {
                disposition.push_str(&format!("; filename=\"{file_name}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = part.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn app_with(stub: Arc<StubGenerator>) -> Router {
        build_router(AppState {
            llm: stub,
            config: Config::for_tests(),
        })
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn resume_pdf() -> Vec<u8> {
        text_pdf(&["Alpha", "Beta"])
    }

    fn analyze_request(uri: &str, pdf: &[u8]) -> Request<Body> {
        multipart_request(
            uri,
            &[
                text_part("job_description", "Backend role needing Docker and Kubernetes"),
                file_part("resume.pdf", "application/pdf", pdf),
            ],
        )
    }

    #[tokio::test]
    async fn test_page_renders_report_for_valid_upload() {
        let stub = Arc::new(StubGenerator::replying(&format!("```json\n{WELL_FORMED}\n```")));
        let app = app_with(stub.clone());

        let response = app
            .oneshot(analyze_request("/analyze", &resume_pdf()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"<progress value="82" max="100">"#));
        assert!(html.contains("<strong>82% match</strong> with the job description."));
        assert_eq!(html.matches(r#"<span class="tag">"#).count(), 2);
        assert!(html.contains(r#"<span class="tag">Docker</span>"#));
        assert!(html.contains(r#"<span class="tag">Kubernetes</span>"#));
        assert!(html.contains(r#"<div class="alert info">Strong backend skills.</div>"#));

        assert_eq!(stub.calls(), 1);
        let prompt = stub.last_prompt().unwrap();
        assert!(prompt.contains("Alpha"));
        assert!(prompt.contains("Beta"));
        assert!(prompt.contains("Backend role needing Docker and Kubernetes"));
    }

    #[tokio::test]
    async fn test_page_echoes_prose_reply_for_valid_upload() {
        let prose = "This candidate looks like a solid fit overall.";
        let stub = Arc::new(StubGenerator::replying(prose));
        let app = app_with(stub.clone());

        let response = app
            .oneshot(analyze_request("/analyze", &resume_pdf()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(PARSE_FAILURE_MESSAGE));
        assert!(html.contains(&format!("<pre><code>{prose}</code></pre>")));
    }

    #[tokio::test]
    async fn test_api_returns_result_for_valid_upload() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let response = app
            .oneshot(analyze_request("/api/v1/analyze", &resume_pdf()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["match_percent"], 82);
        assert_eq!(
            body["missing_keywords"],
            serde_json::json!(["Docker", "Kubernetes"])
        );
        assert_eq!(body["profile_summary"], "Strong backend skills.");
        assert_eq!(body["model"], "stub");
        assert!(body["request_id"].is_string());
        assert!(body["analyzed_at"].is_string());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_api_unparseable_reply_returns_kind_and_raw_text() {
        let reply = r#"{"JD Match":"140%","MissingKeywords":[],"Profile Summary":"ok"}"#;
        let stub = Arc::new(StubGenerator::replying(reply));
        let app = app_with(stub.clone());

        let response = app
            .oneshot(analyze_request("/api/v1/analyze", &resume_pdf()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "UNPARSEABLE_REPLY");
        assert_eq!(body["error"]["kind"], "percentage_out_of_range");
        assert_eq!(body["error"]["raw_reply"], reply);
    }

    #[tokio::test]
    async fn test_api_model_failure_is_bad_gateway() {
        let stub = Arc::new(StubGenerator::failing(403, "API key not valid."));
        let app = app_with(stub.clone());

        let response = app
            .oneshot(analyze_request("/api/v1/analyze", &resume_pdf()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_page_renders_oversized_upload_error_in_page() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = build_router(AppState {
            llm: stub.clone(),
            config: Config {
                max_upload_bytes: 256,
                ..Config::for_tests()
            },
        });

        let big = vec![b'x'; 4096];
        let response = app
            .oneshot(analyze_request("/analyze", &big))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"<div class="alert error">Invalid"#));
        assert!(html.contains(r#"name="job_description""#));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let app = app_with(Arc::new(StubGenerator::replying(WELL_FORMED)));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Smart ATS Resume Analyzer"));
        assert!(html.contains("Analyze Resume"));
    }

    #[tokio::test]
    async fn test_page_warns_without_resume_and_skips_model() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/analyze",
            &[text_part("job_description", "Rust backend engineer")],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(MISSING_INPUTS_WARNING));
        assert!(html.contains("Rust backend engineer"));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_page_warns_without_job_description_and_skips_model() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/analyze",
            &[
                text_part("job_description", "   \n"),
                file_part("resume.pdf", "application/pdf", b"%PDF-1.4 stub"),
            ],
        );
        let html = body_text(app.oneshot(request).await.unwrap()).await;

        assert!(html.contains(MISSING_INPUTS_WARNING));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_page_treats_empty_file_part_as_missing() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/analyze",
            &[
                text_part("job_description", "Data engineer"),
                file_part("", "application/octet-stream", b""),
            ],
        );
        let html = body_text(app.oneshot(request).await.unwrap()).await;

        assert!(html.contains(MISSING_INPUTS_WARNING));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_page_rejects_non_pdf_upload() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/analyze",
            &[
                text_part("job_description", "Data engineer"),
                file_part("resume.docx", "application/msword", b"PK\x03\x04"),
            ],
        );
        let html = body_text(app.oneshot(request).await.unwrap()).await;

        assert!(html.contains(NOT_A_PDF_WARNING));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_page_reports_unreadable_pdf() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/analyze",
            &[
                text_part("job_description", "Data engineer"),
                file_part("resume.pdf", "application/pdf", b"not really a pdf"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(UNREADABLE_RESUME_MESSAGE));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_missing_inputs_is_validation_error() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/api/v1/analyze",
            &[file_part("resume.pdf", "application/pdf", b"%PDF-1.4 stub")],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_unreadable_pdf_is_unprocessable() {
        let stub = Arc::new(StubGenerator::replying(WELL_FORMED));
        let app = app_with(stub.clone());

        let request = multipart_request(
            "/api/v1/analyze",
            &[
                text_part("job_description", "Data engineer"),
                file_part("resume.pdf", "application/pdf", b"garbage"),
            ],
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "UNREADABLE_DOCUMENT");
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_page_for_parsed_result_renders_report() {
        let result = AnalysisResult {
            match_percent: 82,
            missing_keywords: vec!["Docker".to_string(), "Kubernetes".to_string()],
            profile_summary: "Strong backend skills.".to_string(),
        };
        let html = page_for_result("JD", Some(Ok(AnalysisOutcome::Analyzed(result)))).unwrap();

        assert!(html.contains("<strong>82% match</strong>"));
        assert_eq!(html.matches(r#"<span class="tag">"#).count(), 2);
        assert!(html.contains("Strong backend skills."));
    }

    #[test]
    fn test_page_for_empty_keywords_shows_success() {
        let result = AnalysisResult {
            match_percent: 95,
            missing_keywords: vec![],
            profile_summary: "Excellent fit.".to_string(),
        };
        let html = page_for_result("JD", Some(Ok(AnalysisOutcome::Analyzed(result)))).unwrap();
        assert!(html.contains(NO_MISSING_KEYWORDS_MESSAGE));
    }

    #[test]
    fn test_page_for_unparseable_reply_echoes_raw_text() {
        let outcome = AnalysisOutcome::Unparseable {
            error: ReplyError::MalformedJson("expected value".to_string()),
            raw_reply: "The candidate is a good match.".to_string(),
        };
        let html = page_for_result("JD", Some(Ok(outcome))).unwrap();

        assert!(html.contains(PARSE_FAILURE_MESSAGE));
        assert!(html.contains("The candidate is a good match."));
    }

    #[test]
    fn test_page_for_model_failure_uses_generic_error() {
        let err = AppError::Llm(LlmError::Api {
            status: 401,
            message: "API key not valid.".to_string(),
        });
        let html = page_for_result("JD", Some(Err(err))).unwrap();

        assert!(html.contains(PARSE_FAILURE_MESSAGE));
        assert!(!html.contains("API key not valid."));
    }

    #[test]
    fn test_page_for_internal_error_propagates() {
        let err = AppError::Internal(anyhow::anyhow!("join failure"));
        assert!(page_for_result("JD", Some(Err(err))).is_err());
    }

    #[test]
    fn test_into_inputs_requires_both_fields() {
        let resume = || UploadedResume {
            file_name: Some("cv.pdf".to_string()),
            content_type: None,
            bytes: Bytes::from_static(b"%PDF"),
        };

        assert!(AnalysisForm {
            job_description: "JD".to_string(),
            resume: None,
        }
        .into_inputs()
        .is_none());
        assert!(AnalysisForm {
            job_description: String::new(),
            resume: Some(resume()),
        }
        .into_inputs()
        .is_none());

        let (jd, upload) = AnalysisForm {
            job_description: "JD".to_string(),
            resume: Some(resume()),
        }
        .into_inputs()
        .unwrap();
        assert_eq!(jd, "JD");
        assert_eq!(upload.file_name.as_deref(), Some("cv.pdf"));
    }
}
