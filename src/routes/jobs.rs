use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::job_dto::{CreateJobPayload, JobListQuery, JobListResponse, JobStatusPayload, UpdateJobPayload},
    error::Result,
    middleware::auth::AuthUser,
    models::job::Job,
    routes::extract::{Json, Path, Query},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(JobListQuery),
    responses((status = 200, description = "Jobs visible to the caller", body = JobListResponse)),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.job_service.list(&user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "No company claim")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job", body = Job),
        (status = 404, description = "Job not found or not visible")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let mut job = state.job_service.get_visible(&user, &id).await?;
    job.embedding.clear();
    Ok(Json(job))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let mut job = state.job_service.update(&user, &id, payload).await?;
    job.embedding.clear();
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/status",
    params(("id" = String, Path, description = "Job id")),
    request_body = JobStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Job),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn set_job_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<JobStatusPayload>,
) -> Result<impl IntoResponse> {
    let mut job = state.job_service.set_status(&user, &id, payload.status).await?;
    job.embedding.clear();
    Ok(Json(job))
}
