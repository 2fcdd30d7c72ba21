use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::candidate::{
    CandidateProfile, ExperienceLevel, ProfileLinks, SalaryExpectation,
};
use crate::services::candidate_service::CandidatePatch;
use crate::services::worker_pool::JobPriority;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPayload {
    #[validate(length(min = 1, max = 128))]
    pub candidate_id: String,
    #[serde(default)]
    pub priority: JobPriority,
    /// Base64 encoded resume.
    pub resume_file: Option<String>,
    pub resume_mime_type: Option<String>,
    /// Base64 encoded introduction video.
    pub video_file: Option<String>,
    pub video_mime_type: Option<String>,
    pub profile_picture: Option<String>,
    pub profile_picture_mime_type: Option<String>,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub experience: Option<ExperienceLevel>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub skills: Vec<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    pub links: Option<ProfileLinks>,
    pub salary_expectation: Option<SalaryExpectation>,
    #[validate(length(max = 4000))]
    pub summary: Option<String>,
}

/// A decoded upload from the onboarding body.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub data: Bytes,
    pub mime_type: String,
}

impl OnboardingPayload {
    pub fn resume(&self) -> Result<Option<DecodedFile>> {
        decode_file("resumeFile", &self.resume_file, &self.resume_mime_type)
    }

    pub fn video(&self) -> Result<Option<DecodedFile>> {
        decode_file("videoFile", &self.video_file, &self.video_mime_type)
    }

    pub fn picture(&self) -> Result<Option<DecodedFile>> {
        decode_file(
            "profilePicture",
            &self.profile_picture,
            &self.profile_picture_mime_type,
        )
    }

    /// Basic fields as typed by the candidate.
    pub fn basics(&self) -> CandidatePatch {
        CandidatePatch {
            title: non_blank(&self.title),
            experience: self.experience,
            location: non_blank(&self.location),
            skills: (!self.skills.is_empty()).then(|| clean_skills(&self.skills)),
            phone: non_blank(&self.phone),
            links: self.links.clone().filter(|l| !l.is_empty()),
            salary_expectation: self.salary_expectation.clone(),
            summary: non_blank(&self.summary),
            ..Default::default()
        }
    }

    /// The basic fields as hints for the AI pipeline.
    pub fn hints(&self) -> CandidateProfile {
        let basics = self.basics();
        CandidateProfile {
            id: self.candidate_id.clone(),
            title: basics.title,
            experience: basics.experience,
            location: basics.location,
            skills: basics.skills.unwrap_or_default(),
            phone: basics.phone,
            links: basics.links.unwrap_or_default(),
            salary_expectation: basics.salary_expectation,
            summary: basics.summary,
            ..Default::default()
        }
    }
}

fn decode_file(
    field: &str,
    data: &Option<String>,
    mime_type: &Option<String>,
) -> Result<Option<DecodedFile>> {
    let Some(encoded) = data.as_deref().filter(|d| !d.trim().is_empty()) else {
        return Ok(None);
    };
    let mime_type = mime_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("{} requires a MIME type", field)))?;
    // Accept data URLs as well as bare base64.
    let encoded = encoded
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(encoded)
        .trim();
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| Error::BadRequest(format!("{} is not valid base64", field)))?;
    if bytes.is_empty() {
        return Err(Error::BadRequest(format!("{} is empty", field)));
    }
    Ok(Some(DecodedFile {
        data: Bytes::from(bytes),
        mime_type: mime_type.to_ascii_lowercase(),
    }))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clean_skills(skills: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for skill in skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            out.push(skill.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingData {
    pub candidate_id: String,
    pub profile_complete: bool,
    pub processing_queued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_ids: Option<Vec<uuid::Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<CandidateProfile>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OnboardingResponse {
    pub success: bool,
    pub data: OnboardingData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(extra: serde_json::Value) -> OnboardingPayload {
        let mut body = json!({ "candidateId": "c1" });
        body.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(payload(json!({})).priority, JobPriority::Medium);
        assert_eq!(payload(json!({ "priority": "high" })).priority, JobPriority::High);
    }

    #[test]
    fn decodes_plain_and_data_url_base64() {
        let p = payload(json!({
            "resumeFile": STANDARD.encode(b"hello resume"),
            "resumeMimeType": "TEXT/PLAIN",
            "videoFile": format!("data:video/mp4;base64,{}", STANDARD.encode(b"vid")),
            "videoMimeType": "video/mp4"
        }));
        let resume = p.resume().unwrap().unwrap();
        assert_eq!(&resume.data[..], b"hello resume");
        assert_eq!(resume.mime_type, "text/plain");
        assert_eq!(&p.video().unwrap().unwrap().data[..], b"vid");
        assert!(p.picture().unwrap().is_none());
    }

    #[test]
    fn upload_without_mime_type_is_rejected() {
        let p = payload(json!({ "resumeFile": STANDARD.encode(b"x") }));
        assert!(matches!(p.resume(), Err(Error::BadRequest(_))));
        let p = payload(json!({ "resumeFile": "%%%", "resumeMimeType": "application/pdf" }));
        assert!(matches!(p.resume(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn basics_trim_and_dedupe() {
        let p = payload(json!({
            "title": "  ",
            "location": " Tashkent ",
            "skills": ["Rust", "rust", " SQL "]
        }));
        let basics = p.basics();
        assert_eq!(basics.title, None);
        assert_eq!(basics.location.as_deref(), Some("Tashkent"));
        assert_eq!(basics.skills, Some(vec!["Rust".to_string(), "SQL".to_string()]));
    }
}
