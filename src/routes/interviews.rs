use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::interview_dto::{InterviewFeedbackPayload, ScheduleInterviewPayload},
    error::Result,
    middleware::auth::AuthUser,
    models::interview::Interview,
    routes::extract::{Json, Path},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/interviews",
    request_body = ScheduleInterviewPayload,
    responses(
        (status = 201, description = "Interview scheduled", body = Interview),
        (status = 400, description = "Invalid payload or closed application"),
        (status = 403, description = "Application belongs to another company"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let interview = state.interview_service.schedule(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

#[utoipa::path(
    get,
    path = "/api/interviews/mine",
    responses((status = 200, description = "Interviews assigned to the caller", body = Vec<Interview>)),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn my_interviews(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.interview_service.list_for_interviewer(&user.uid).await?))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/feedback",
    params(("id" = String, Path, description = "Interview id")),
    request_body = InterviewFeedbackPayload,
    responses(
        (status = 200, description = "Feedback recorded", body = Interview),
        (status = 403, description = "Not the assigned interviewer"),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Feedback already submitted")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<InterviewFeedbackPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let interview = state
        .interview_service
        .submit_feedback(&user, &id, payload)
        .await?;
    Ok(Json(interview))
}
