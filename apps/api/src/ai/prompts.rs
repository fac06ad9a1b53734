//! Prompt templates for the analysis, optimization, and filename collaborators.
//!
//! Templates use `{placeholder}` markers filled with `str::replace`. All
//! JSON-producing prompts must spell out the exact shape the caller
//! deserializes.

pub const ANALYZE_SYSTEM: &str = "You are an expert ATS (Applicant Tracking System) analyst. \
Compare the provided resume with the job description requirements and calculate an ATS \
compatibility score from 0-100. Provide detailed reasoning for your score and identify \
matched and missing keywords. Return your analysis in JSON format.";

pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"
Job Description:
{criteria_text}

Resume:
{source_text}

Return your analysis in this exact JSON format:
{
  "score": number,
  "needs_work": boolean,
  "matched_terms": ["string"],
  "missing_terms": ["string"],
  "narrative": "string"
}"#;

pub const OPTIMIZE_SYSTEM: &str = "You are an expert resume optimizer for ATS compatibility. \
Analyze the resume against the job description and suggest specific modifications to improve \
the ATS score. Do not fabricate experience or qualifications. Focus on reorganizing, \
rephrasing, and highlighting relevant experience. Each suggested change must quote an exact \
fragment of the resume as its original text. Return your suggestions in JSON format.";

pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"
Job Description:
{criteria_text}

Resume:
{source_text}

Current ATS score: {score}
Missing keywords: {missing_terms}

Return your optimization in this exact JSON format:
{
  "projected_score": number,
  "edits": [
    {
      "id": "string",
      "section": "string",
      "original": "string",
      "suggested": "string",
      "rationale": "string"
    }
  ],
  "general_notes": ["string"],
  "proposed_name": "string"
}"#;

pub const FILENAME_SYSTEM: &str = "Generate a resume filename based on the applicant's name \
and job details. Follow the format: [FirstName]_[LastName]_[Position]_[Company]. Respond \
with the filename only.";

pub const FILENAME_PROMPT_TEMPLATE: &str = r#"
Extract the applicant's name from this resume:
{source_excerpt}

Extract the job title and company from this job description:
{criteria_excerpt}

Generate a filename with the format: [FirstName]_[LastName]_[Position]_[Company]
The filename must only include letters, numbers, and underscores. No spaces or special characters."#;
