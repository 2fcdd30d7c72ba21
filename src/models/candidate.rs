use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const COLLECTION: &str = "candidates";

/// Years-of-experience bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    /// 0-1 years
    Entry,
    /// 1-3 years
    Junior,
    /// 3-5 years
    Mid,
    /// 5-10 years
    Senior,
    /// 10+ years
    Lead,
}

impl ExperienceLevel {
    /// Lenient parse of labels the AI and older clients produce ("senior", "5-10", "10+").
    pub fn from_label(raw: &str) -> Option<Self> {
        let label = raw.trim().to_ascii_lowercase();
        let level = match label.as_str() {
            "entry" | "0-1" | "intern" | "graduate" => ExperienceLevel::Entry,
            "junior" | "1-3" => ExperienceLevel::Junior,
            "mid" | "middle" | "3-5" => ExperienceLevel::Mid,
            "senior" | "5-10" => ExperienceLevel::Senior,
            "lead" | "10+" | "principal" | "staff" => ExperienceLevel::Lead,
            _ => return None,
        };
        Some(level)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none()
            && self.github.is_none()
            && self.portfolio.is_none()
            && self.website.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryExpectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub summary: String,
    pub communication_score: u8,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Candidate document as stored in the `candidates` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub id: String,
    pub title: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub phone: Option<String>,
    pub links: ProfileLinks,
    pub salary_expectation: Option<SalaryExpectation>,
    pub summary: Option<String>,

    pub resume_uploaded: bool,
    pub video_intro_recorded: bool,
    pub profile_complete: bool,

    pub resume_path: Option<String>,
    pub resume_mime_type: Option<String>,
    pub resume_sha256: Option<String>,
    pub video_path: Option<String>,
    pub video_mime_type: Option<String>,
    pub photo_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    pub resume_summary: Option<String>,
    pub resume_highlights: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    pub video_analysis: Option<VideoAnalysis>,
    pub ai_processed_at: Option<DateTime<Utc>>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    /// Public view: drops the raw resume text and the embedding vector.
    pub fn redacted(mut self) -> Self {
        self.resume_text = None;
        self.embedding.clear();
        self
    }

    /// Text the profile flows fall back to when no resume has been processed.
    pub fn hint_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("Title: {}", title));
        }
        if let Some(experience) = &self.experience {
            parts.push(format!("Experience: {:?}", experience));
        }
        if let Some(location) = &self.location {
            parts.push(format!("Location: {}", location));
        }
        if !self.skills.is_empty() {
            parts.push(format!("Skills: {}", self.skills.join(", ")));
        }
        if let Some(summary) = &self.summary {
            parts.push(format!("Summary: {}", summary));
        }
        parts.join("\n")
    }
}
