use axum::{extract::State, response::IntoResponse, Extension};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    middleware::auth::AuthUser,
    routes::extract::{Json, Path},
    services::worker_pool::ProcessingJob,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/processing/jobs/{id}",
    params(("id" = String, Path, description = "Processing job id")),
    responses(
        (status = 200, description = "Job status", body = ProcessingJob),
        (status = 404, description = "Unknown job")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_job_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let not_found = || Error::NotFound(format!("Processing job {} not found", id));
    let job_id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let job = state
        .worker_pool
        .get_job_status(job_id)
        .await
        .filter(|job| user.ensure_self_or_staff(&job.candidate_id).is_ok())
        .ok_or_else(not_found)?;
    Ok(Json(job))
}
