use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::application_dto::{ApplicationStatusPayload, ApplyPayload},
    error::Result,
    middleware::auth::AuthUser,
    models::application::Application,
    routes::extract::{Json, Path},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 400, description = "Job is not accepting applications"),
        (status = 404, description = "Job or candidate profile not found"),
        (status = 409, description = "Already applied")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state.application_service.apply(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    responses((status = 200, description = "The caller's applications", body = Vec<Application>)),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.application_service.list_for_candidate(&user.uid).await?))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}/applications",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Applications, best match first", body = Vec<Application>),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn job_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.application_service.list_for_job(&user, &id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(("id" = String, Path, description = "Application id")),
    request_body = ApplicationStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Application),
        (status = 403, description = "Application belongs to another company"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<ApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .update_status(&user, &id, payload.status)
        .await?;
    Ok(Json(application))
}
