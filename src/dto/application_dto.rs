use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPayload {
    #[validate(length(min = 1, max = 128))]
    pub job_id: String,
    #[validate(length(max = 8000))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplicationStatusPayload {
    pub status: ApplicationStatus,
}
