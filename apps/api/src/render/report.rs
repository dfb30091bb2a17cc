use crate::analysis::response::AnalysisResult;
use crate::render::html_escape;

pub const MISSING_INPUTS_WARNING: &str = "Please provide both resume and job description.";
pub const PARSE_FAILURE_MESSAGE: &str = "Couldn't parse the response properly. Please try again.";
pub const NO_MISSING_KEYWORDS_MESSAGE: &str = "No missing keywords. Great job!";

/// What the page shows below the form.
#[derive(Debug)]
pub enum PageView<'a> {
    Empty,
    Warning(&'a str),
    Report(&'a AnalysisResult),
    /// Generic failure plus whatever the model sent back (may be empty).
    ParseFailure { raw_reply: &'a str },
    Error(&'a str),
}

pub fn render_view(view: &PageView<'_>) -> String {
    match view {
        PageView::Empty => String::new(),
        PageView::Warning(message) => {
            format!(r#"<div class="alert warning">⚠️ {}</div>"#, html_escape(message))
        }
        PageView::Report(result) => render_report(result),
        PageView::ParseFailure { raw_reply } => format!(
            r#"<div class="alert error">{}</div>
<pre><code>{}</code></pre>"#,
            PARSE_FAILURE_MESSAGE,
            html_escape(raw_reply)
        ),
        PageView::Error(message) => {
            format!(r#"<div class="alert error">{}</div>"#, html_escape(message))
        }
    }
}

fn render_report(result: &AnalysisResult) -> String {
    let keywords = if result.missing_keywords.is_empty() {
        format!(r#"<div class="alert success">{NO_MISSING_KEYWORDS_MESSAGE}</div>"#)
    } else {
        result
            .missing_keywords
            .iter()
            .map(|k| format!(r#"<span class="tag">{}</span>"#, html_escape(k)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<div class="report-container">
<h3>✅ Match Percentage</h3>
<progress value="{percent}" max="100">{percent}%</progress>
<p><strong>{percent}% match</strong> with the job description.</p>
<h3>❌ Missing Keywords</h3>
<div class="keywords">
{keywords}
</div>
<h3>Profile Summary</h3>
<div class="alert info">{summary}</div>
</div>"#,
        percent = result.match_percent,
        keywords = keywords,
        summary = html_escape(&result.profile_summary),
    )
}
