//! Single-call AI flows.
//!
//! Each flow sends one request with a fixed prompt and expected JSON shape to the
//! configured [`AiProvider`] and returns the parsed, validated output. There is no
//! retry: a missing or malformed answer is an [`Error::Ai`].

use std::sync::Arc;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::ai_dto::JobDescriptionInput;
use crate::error::{Error, Result};
use crate::models::candidate::{
    CandidateProfile, ExperienceLevel, ProfileLinks, SalaryExpectation, VideoAnalysis,
};
use crate::services::ai_provider::{AiProvider, FlowRequest};

const MAX_EMBED_CHARS: usize = 8_000;
const MAX_PROMPT_CHARS: usize = 24_000;

pub const FLOW_RESUME_TEXT: &str = "extract_resume_text";
pub const FLOW_PROFILE: &str = "extract_profile";
pub const FLOW_SUMMARY: &str = "summarize_resume";
pub const FLOW_VIDEO: &str = "analyze_video_intro";
pub const FLOW_JOB_DESCRIPTION: &str = "generate_job_description";

const RESUME_TEXT_PROMPT: &str = r#"You convert resumes into plain text.
Return a JSON object {"text": "<full resume text>"}.
Keep section order, drop decoration, do not summarize or invent content."#;

const PROFILE_PROMPT: &str = r#"You are an experienced technical recruiter extracting a structured candidate profile.
Return a JSON object with these optional fields:
{"title": string, "experience": "entry"|"junior"|"mid"|"senior"|"lead", "location": string,
 "skills": [string], "phone": string,
 "links": {"linkedin": string, "github": string, "portfolio": string, "website": string},
 "salaryExpectation": {"min": number, "max": number, "currency": string}}
Experience buckets: entry 0-1 years, junior 1-3, mid 3-5, senior 5-10, lead 10+.
Only use facts present in the input. Omit fields you cannot determine."#;

const SUMMARY_PROMPT: &str = r#"You write recruiter-facing candidate summaries.
Return a JSON object {"summary": string, "highlights": [string]}.
The summary is 3-5 sentences, factual and neutral. Highlights are at most 5 short bullet phrases."#;

const VIDEO_PROMPT: &str = r#"You review short candidate video introductions.
Return a JSON object {"summary": string, "communicationScore": number, "highlights": [string]}.
communicationScore is 0-100 and reflects clarity, structure and confidence only."#;

const JOB_DESCRIPTION_PROMPT: &str = r#"You are an expert HR copywriter.
Write an engaging, professional job description.
Return a JSON object {"description": string, "responsibilities": [string], "requirements": [string]}."#;

#[derive(Debug, Clone, Deserialize, Validate)]
struct ResumeTextOutput {
    #[validate(length(min = 1))]
    text: String,
}

/// Structured fields the profile flow pulls out of resume text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedProfile {
    pub title: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub phone: Option<String>,
    pub links: ProfileLinks,
    pub salary_expectation: Option<SalaryExpectation>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
struct RawProfileOutput {
    title: Option<String>,
    experience: Option<String>,
    location: Option<String>,
    skills: Vec<String>,
    phone: Option<String>,
    links: ProfileLinks,
    salary_expectation: Option<SalaryExpectation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResumeSummary {
    #[validate(length(min = 1))]
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct VideoOutput {
    #[validate(length(min = 1))]
    summary: String,
    #[validate(range(min = 0.0, max = 100.0))]
    communication_score: f64,
    #[serde(default)]
    highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GeneratedJobDescription {
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Clone)]
pub struct AiFlows {
    provider: Arc<dyn AiProvider>,
}

impl AiFlows {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub async fn extract_resume_text(&self, data: Bytes, mime_type: &str) -> Result<String> {
        if mime_type == "text/plain" {
            let text = String::from_utf8_lossy(&data).trim().to_string();
            if text.is_empty() {
                return Err(no_usable_output(FLOW_RESUME_TEXT, "empty document"));
            }
            return Ok(text);
        }

        let request = FlowRequest::new(FLOW_RESUME_TEXT, RESUME_TEXT_PROMPT)
            .text("Extract the full text of the attached resume.")
            .media(mime_type, data)
            .temperature(0.0);
        let output: ResumeTextOutput = self.run(request).await?;
        Ok(output.text.trim().to_string())
    }

    pub async fn extract_profile(
        &self,
        resume_text: &str,
        hints: &CandidateProfile,
    ) -> Result<ExtractedProfile> {
        let input = json!({
            "resumeText": clip(resume_text, MAX_PROMPT_CHARS),
            "knownDetails": hints.hint_text(),
        });
        let request = FlowRequest::new(FLOW_PROFILE, PROFILE_PROMPT).text(input.to_string());
        let raw: RawProfileOutput = self.run(request).await?;

        Ok(ExtractedProfile {
            title: non_empty(raw.title),
            experience: raw.experience.as_deref().and_then(ExperienceLevel::from_label),
            location: non_empty(raw.location),
            skills: dedup_skills(raw.skills),
            phone: non_empty(raw.phone),
            links: raw.links,
            salary_expectation: raw.salary_expectation,
        })
    }

    pub async fn summarize_resume(&self, resume_text: &str) -> Result<ResumeSummary> {
        let request = FlowRequest::new(FLOW_SUMMARY, SUMMARY_PROMPT)
            .text(clip(resume_text, MAX_PROMPT_CHARS))
            .temperature(0.4);
        let mut summary: ResumeSummary = self.run(request).await?;
        summary.summary = summary.summary.trim().to_string();
        if summary.summary.is_empty() {
            return Err(no_usable_output(FLOW_SUMMARY, "blank summary"));
        }
        summary.highlights.truncate(5);
        Ok(summary)
    }

    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let text = clip(text, MAX_EMBED_CHARS);
        if text.trim().is_empty() {
            return Err(no_usable_output("embed_text", "empty input"));
        }
        let vector = self
            .provider
            .embed(vec![text])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        if vector.is_empty() {
            return Err(no_usable_output("embed_text", "empty vector"));
        }
        Ok(vector)
    }

    pub async fn analyze_video_intro(&self, data: Bytes, mime_type: &str) -> Result<VideoAnalysis> {
        let request = FlowRequest::new(FLOW_VIDEO, VIDEO_PROMPT)
            .text("Review the attached video introduction.")
            .media(mime_type, data)
            .temperature(0.3);
        let output: VideoOutput = self.run(request).await?;
        Ok(VideoAnalysis {
            summary: output.summary.trim().to_string(),
            communication_score: output.communication_score.round() as u8,
            highlights: output.highlights,
        })
    }

    pub async fn generate_job_description(
        &self,
        input: &JobDescriptionInput,
    ) -> Result<GeneratedJobDescription> {
        let request = FlowRequest::new(FLOW_JOB_DESCRIPTION, JOB_DESCRIPTION_PROMPT)
            .text(serde_json::to_string(input)?)
            .temperature(0.8);
        self.run(request).await
    }

    async fn run<T>(&self, request: FlowRequest) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let flow = request.flow;
        tracing::debug!(flow, "running AI flow");
        let value = self.provider.complete_json(request).await?;
        parse_output(flow, value)
    }
}

fn parse_output<T>(flow: &str, value: JsonValue) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value).map_err(|e| no_usable_output(flow, e))?;
    parsed.validate().map_err(|e| no_usable_output(flow, e))?;
    Ok(parsed)
}

fn no_usable_output(flow: &str, detail: impl std::fmt::Display) -> Error {
    Error::Ai(format!("AI flow `{}` returned no usable output: {}", flow, detail))
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim().to_string();
        if !skill.is_empty() && !out.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
            out.push(skill);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_provider::MockAiProvider;

    fn flows_with(mock: MockAiProvider) -> AiFlows {
        AiFlows::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn plain_text_resumes_skip_the_provider() {
        let mut mock = MockAiProvider::new();
        mock.expect_complete_json().never();
        let text = flows_with(mock)
            .extract_resume_text(Bytes::from_static(b"  Jane Doe\nRust engineer  "), "text/plain")
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\nRust engineer");
    }

    #[tokio::test]
    async fn profile_output_is_normalized() {
        let mut mock = MockAiProvider::new();
        mock.expect_complete_json()
            .withf(|req| req.flow == FLOW_PROFILE)
            .returning(|_| {
                Ok(json!({
                    "title": "  Backend Engineer ",
                    "experience": "5-10",
                    "skills": ["Rust", "rust", " Postgres ", ""],
                    "location": ""
                }))
            });
        let profile = flows_with(mock)
            .extract_profile("resume", &CandidateProfile::default())
            .await
            .unwrap();
        assert_eq!(profile.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(profile.experience, Some(ExperienceLevel::Senior));
        assert_eq!(profile.skills, vec!["Rust", "Postgres"]);
        assert_eq!(profile.location, None);
    }

    #[tokio::test]
    async fn empty_summary_is_not_usable() {
        let mut mock = MockAiProvider::new();
        mock.expect_complete_json()
            .returning(|_| Ok(json!({ "summary": "", "highlights": [] })));
        let err = flows_with(mock).summarize_resume("text").await.unwrap_err();
        assert!(matches!(err, Error::Ai(msg) if msg.contains(FLOW_SUMMARY)));
    }

    #[tokio::test]
    async fn video_score_out_of_range_is_rejected() {
        let mut mock = MockAiProvider::new();
        mock.expect_complete_json()
            .returning(|_| Ok(json!({ "summary": "ok", "communicationScore": 140 })));
        let err = flows_with(mock)
            .analyze_video_intro(Bytes::from_static(b"video"), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ai(_)));
    }

    #[tokio::test]
    async fn empty_embedding_is_an_error() {
        let mut mock = MockAiProvider::new();
        mock.expect_embed().returning(|_| Ok(vec![vec![]]));
        assert!(flows_with(mock).embed_text("rust").await.is_err());
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "hé");
    }
}
