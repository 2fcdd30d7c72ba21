use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const COLLECTION: &str = "jobs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Closed,
    Archived,
}

impl JobStatus {
    pub fn accepts_applications(&self) -> bool {
        matches!(self, JobStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStats {
    pub applications: u64,
    pub interviews: u64,
    pub hires: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub company_id: String,
    pub recruiter_id: String,
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub stats: JobStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Text used to embed the posting for candidate matching.
    pub fn matching_text(&self) -> String {
        let mut text = self.title.clone();
        if let Some(department) = &self.department {
            text.push_str(&format!("\nDepartment: {}", department));
        }
        if let Some(description) = &self.description {
            text.push_str(&format!("\n{}", description));
        }
        if !self.requirements.is_empty() {
            text.push_str(&format!("\nRequirements: {}", self.requirements.join("; ")));
        }
        if !self.skills.is_empty() {
            text.push_str(&format!("\nSkills: {}", self.skills.join(", ")));
        }
        text
    }
}
