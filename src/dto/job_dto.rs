use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::job::{Job, JobStatus};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 120))]
    pub department: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub status: Option<JobStatus>,
    /// Only honoured for super admins, who carry no company claim.
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 120))]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

impl UpdateJobPayload {
    /// True when the posting text used for matching changes.
    pub fn touches_matching_text(&self) -> bool {
        self.title.is_some()
            || self.department.is_some()
            || self.description.is_some()
            || self.requirements.is_some()
            || self.skills.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JobStatusPayload {
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<JobStatus>,
    pub department: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub items: Vec<Job>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}
