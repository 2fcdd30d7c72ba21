use axum::{extract::State, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::ai_dto::{JobDescriptionInput, ResumeSummaryPayload},
    error::Result,
    middleware::auth::AuthUser,
    routes::extract::Json,
    services::ai_flows::{GeneratedJobDescription, ResumeSummary},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/ai/job-description",
    request_body = JobDescriptionInput,
    responses(
        (status = 200, description = "Generated job description", body = GeneratedJobDescription),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "AI processing failed")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn generate_job_description(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<JobDescriptionInput>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    tracing::info!(uid = %user.uid, title = %payload.title, "generating job description");
    let generated = state
        .orchestrator
        .flows()
        .generate_job_description(&payload)
        .await?;
    Ok(Json(generated))
}

#[utoipa::path(
    post,
    path = "/api/ai/resume-summary",
    request_body = ResumeSummaryPayload,
    responses(
        (status = 200, description = "Summary of the given resume text", body = ResumeSummary),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "AI processing failed")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn summarize_resume(
    State(state): State<AppState>,
    Json(payload): Json<ResumeSummaryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let summary = state
        .orchestrator
        .flows()
        .summarize_resume(&payload.resume_text)
        .await?;
    Ok(Json(summary))
}
