use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::interview::Recommendation;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInterviewPayload {
    #[validate(length(min = 1, max = 128))]
    pub application_id: String,
    #[validate(length(min = 1, max = 128))]
    pub interviewer_id: String,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(url)]
    pub meeting_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFeedbackPayload {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    pub recommendation: Recommendation,
    #[validate(length(max = 8000))]
    pub notes: Option<String>,
}
