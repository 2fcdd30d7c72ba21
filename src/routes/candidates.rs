use axum::{extract::State, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::onboarding_dto::{OnboardingPayload, OnboardingResponse},
    error::Result,
    middleware::auth::AuthUser,
    models::candidate::CandidateProfile,
    routes::extract::{Json, Path},
    services::worker_pool::ProcessingJob,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/candidates/onboarding",
    request_body = OnboardingPayload,
    responses(
        (status = 200, description = "Profile completed or processing queued", body = OnboardingResponse),
        (status = 400, description = "Invalid payload or upload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not allowed or foreign candidateId"),
        (status = 500, description = "AI processing failed")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn onboarding(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<OnboardingPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let data = state.onboarding_service.onboard(&user, payload).await?;
    Ok(Json(OnboardingResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/candidates/{id}",
    params(("id" = String, Path, description = "Candidate user id")),
    responses(
        (status = 200, description = "Candidate profile", body = CandidateProfile),
        (status = 403, description = "Another candidate's profile"),
        (status = 404, description = "Candidate not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    user.ensure_self_or_staff(&id)?;
    let profile = state.candidate_service.require(&id).await?;
    Ok(Json(profile.redacted()))
}

#[utoipa::path(
    get,
    path = "/api/candidates/{id}/processing-jobs",
    params(("id" = String, Path, description = "Candidate user id")),
    responses(
        (status = 200, description = "Processing jobs, newest first", body = Vec<ProcessingJob>),
        (status = 403, description = "Another candidate's jobs")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_processing_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    user.ensure_self_or_staff(&id)?;
    Ok(Json(state.worker_pool.jobs_for_candidate(&id).await))
}
