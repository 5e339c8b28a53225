// Prompt templates for resume evaluation, plus the substitution routine that fills them.
//
// Templates use `{name}` placeholders. Literal braces (the JSON shape shown to the
// model) are written doubled: `{{` and `}}`.

/// Primary match prompt. Placeholders: `{text}`, `{job_description}`.
pub const MATCH_EVALUATION: &str = r#"
You are an experienced Application Tracking System (ATS) with expertise in evaluating resumes
for a wide range of job roles across different industries. Your task is to assess the candidate's
suitability for the role based on the provided job description.

Please assign a percentage match based on how well the resume aligns with the job description
and highlight any missing keywords with high accuracy.

Key areas to evaluate:
- Relevant skills and competencies
- Professional experience and achievements
- Educational background and qualifications
- Certifications and training
- Knowledge of industry-specific tools and technologies
- Soft skills and personal attributes
- Alignment with the job responsibilities and requirements

resume: {text}
job_description: {job_description}

I want the response in a structured format:
{{"JD Match": "%", "MissingKeywords": [], "Profile Summary": ""}}
"#;

/// Tenure analysis. Placeholders: `{text}`, `{today}`.
pub const TENURE_ANALYSIS: &str = r#"Analyze the **Professional Work Experience** section of the resume, focusing exclusively on organizational-level roles (jobs held in formal organizations, excluding internships or non-organizational experiences).
Today's date is {today}.
For each organizational role, extract the following details:
- **Duration of Employment**: Start and end dates, or the total duration in months/years. If a role is ongoing, calculate the duration up to today's date.
- **Gaps Between Roles**: Any periods of unemployment between consecutive organizational roles, with their durations.
Based on this data, provide:
1. **Average Tenure per Job**: Calculate the average time the employee spent in each organizational role.
2. **Career Timeline**: Summarize the total time spent in formal organizational roles, including any ongoing roles calculated up to today's date.
3. **Patterns and Insights**: Identify trends such as:
   - Consistency in tenure across roles.
   - Significant variations in job durations.
   - Gaps in employment and their potential implications.
Ensure the analysis is based only on the **Professional Work Experience** section of the resume. Ignore any unrelated sections or informal experiences.
Resume: {text}
"#;

pub const MISSING_KEYWORDS: &str = "Identify keywords missing from the resume that are present in the job description.\n\nresume: {text}\njob_description: {job_description}";

pub const SKILLS_MATCH: &str =
    "Compare resume skills to the job description.\n\nresume: {text}\njob_description: {job_description}";

pub const PROFILE_SUMMARY: &str = "Provide a Profile Summary and suggest improvements.\n\nresume: {text}\njob_description: {job_description}";

pub const GRAMMAR_FORMATTING: &str = "Review the grammar and formatting of the resume.\n\nresume: {text}\njob_description: {job_description}";

pub const TONE_LANGUAGE: &str = "Evaluate the tone and language of the resume for alignment with the job description.\n\nresume: {text}\njob_description: {job_description}";

/// Fills `{name}` placeholders from `values`. `{{`/`}}` collapse to single braces.
/// Unknown placeholders and unmatched braces are kept verbatim. Substituted values
/// are inserted as-is and never scanned for further placeholders.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail[1..].find('}').map(|end| (&tail[1..=end], end + 2)) {
                Some((name, consumed)) => {
                    match values.iter().find(|(key, _)| *key == name) {
                        Some((_, value)) => out.push_str(value),
                        None => out.push_str(&tail[..consumed]),
                    }
                    rest = &tail[consumed..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
