// LLM prompt constants for the Analysis module.

/// ATS evaluation prompt. Replace `{resume_text}` and `{job_description}` before sending.
pub const ATS_PROMPT_TEMPLATE: &str = r#"Hey Act Like a skilled or very experienced ATS (Application Tracking System)
with a deep understanding of tech field, software engineering, data science,
data analyst and big data engineer. Your task is to evaluate the resume based
on the given job description. You must consider the job market is very competitive
and you should provide best assistance for improving the resumes.

Assign the percentage Matching based on JD and
the missing keywords with high accuracy.

resume: {resume_text}
description: {job_description}

I want the response in one single string having the structure:
{"JD Match":"%","MissingKeywords":[],"Profile Summary":""}"#;

/// Builds the single-turn ATS prompt. Both inputs are interpolated verbatim.
pub fn build_ats_prompt(resume_text: &str, job_description: &str) -> String {
    // Split first so a résumé containing "{job_description}" is not re-substituted.
    let (head, tail) = ATS_PROMPT_TEMPLATE
        .split_once("{job_description}")
        .unwrap_or((ATS_PROMPT_TEMPLATE, ""));
    let mut prompt = head.replace("{resume_text}", resume_text);
    prompt.push_str(job_description);
    prompt.push_str(tail);
    prompt
}
