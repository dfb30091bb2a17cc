//! Server-side HTML for the single analysis page.

pub mod report;

pub use report::{render_view, PageView};

pub const PAGE_TITLE: &str = "Smart ATS";
pub const HEADING: &str = "Smart ATS Resume Analyzer";
pub const TAGLINE: &str = "Boost your resume by matching it to job descriptions using AI";

const STYLE: &str = r#"
html, body { background-color: #f0f4f8; font-family: 'Segoe UI', sans-serif; margin: 0; }
main { max-width: 860px; margin: 0 auto; padding: 1.5rem; }
h1 { color: #222831; text-align: center; }
p.tagline { text-align: center; color: #555; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
textarea { width: 100%; height: 250px; box-sizing: border-box; }
.actions { text-align: center; margin-top: 1rem; }
button { background-color: #2d6cdf; color: white; font-weight: bold; padding: 10px 20px; border-radius: 10px; border: none; transition: 0.3s; cursor: pointer; }
button:hover { background-color: #1b4fa2; }
.busy { display: none; text-align: center; color: #555; margin-top: 0.75rem; }
form.submitting .busy { display: block; }
.report-container { background-color: white; padding: 20px; border-radius: 10px; box-shadow: 0px 0px 10px rgba(0,0,0,0.1); margin-top: 20px; }
progress { width: 100%; height: 1rem; }
.tag { display: inline-block; background-color: #dbeafe; color: #1d4ed8; padding: 5px 10px; margin: 5px; border-radius: 8px; font-size: 14px; }
.alert { padding: 0.75rem 1rem; border-radius: 8px; margin: 0.75rem 0; }
.alert.success { background: #dcfce7; color: #166534; }
.alert.info { background: #dbeafe; color: #1e3a8a; }
.alert.warning { background: #fef9c3; color: #854d0e; }
.alert.error { background: #fee2e2; color: #991b1b; }
pre { background: #1f2937; color: #e5e7eb; padding: 0.75rem; border-radius: 8px; white-space: pre-wrap; }
"#;

/// Renders the full page. `job_description` is echoed back into the form.
pub fn render_page(job_description: &str, view: &PageView<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<main>
<h1>{heading}</h1>
<p class="tagline">{tagline}</p>
<form method="post" action="/analyze" enctype="multipart/form-data" onsubmit="this.classList.add('submitting')">
<div class="columns">
<div>
<h3>Job Description</h3>
<label for="job_description">Paste the Job Description</label>
<textarea id="job_description" name="job_description">{jd}</textarea>
</div>
<div>
<h3>Upload Resume</h3>
<label for="resume">Upload your resume in PDF format</label>
<input id="resume" name="resume" type="file" accept=".pdf,application/pdf">
</div>
</div>
<hr>
<div class="actions"><button type="submit">Analyze Resume</button></div>
<div class="busy">Analyzing your resume...</div>
</form>
{view}
</main>
</body>
</html>"#,
        title = PAGE_TITLE,
        style = STYLE,
        heading = HEADING,
        tagline = TAGLINE,
        jd = html_escape(job_description),
        view = render_view(view),
    )
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
