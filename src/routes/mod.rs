pub mod ai;
pub mod applications;
pub mod candidates;
pub mod extract;
pub mod health;
pub mod interviews;
pub mod jobs;
pub mod processing;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::middleware::{
    auth::{require_roles, RoleGuard},
    rate_limit::{rate_limit_middleware, RateLimiter},
    timeout::{timeout_middleware, TimeoutPolicy},
};
use crate::models::user::Role;
use crate::AppState;

const ONBOARDING_ROLES: &[Role] = &[Role::Candidate, Role::SuperAdmin];
const CANDIDATE_ROLES: &[Role] = &[Role::Candidate];
const INTERVIEWER_ROLES: &[Role] = &[Role::Interviewer];
const REVIEWER_ROLES: &[Role] = &[
    Role::Recruiter,
    Role::Interviewer,
    Role::CompanyAdmin,
    Role::SuperAdmin,
];
const SUMMARY_ROLES: &[Role] = &[
    Role::Candidate,
    Role::Recruiter,
    Role::CompanyAdmin,
    Role::SuperAdmin,
];

/// JSON fields around the base64 uploads.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hiring Backend API",
        description = "Candidate onboarding with AI enrichment, jobs, applications and interviews"
    ),
    paths(
        health::health,
        candidates::onboarding,
        candidates::get_candidate,
        candidates::list_processing_jobs,
        processing::get_job_status,
        jobs::list_jobs,
        jobs::create_job,
        jobs::get_job,
        jobs::update_job,
        jobs::set_job_status,
        applications::apply,
        applications::my_applications,
        applications::job_applications,
        applications::update_application_status,
        interviews::schedule_interview,
        interviews::my_interviews,
        interviews::submit_feedback,
        ai::generate_job_description,
        ai::summarize_resume,
    ),
    components(schemas(
        crate::dto::onboarding_dto::OnboardingPayload,
        crate::dto::onboarding_dto::OnboardingResponse,
        crate::dto::onboarding_dto::OnboardingData,
        crate::dto::job_dto::CreateJobPayload,
        crate::dto::job_dto::UpdateJobPayload,
        crate::dto::job_dto::JobStatusPayload,
        crate::dto::job_dto::JobListResponse,
        crate::dto::application_dto::ApplyPayload,
        crate::dto::application_dto::ApplicationStatusPayload,
        crate::dto::interview_dto::ScheduleInterviewPayload,
        crate::dto::interview_dto::InterviewFeedbackPayload,
        crate::dto::ai_dto::JobDescriptionInput,
        crate::dto::ai_dto::ResumeSummaryPayload,
        crate::models::candidate::CandidateProfile,
        crate::models::candidate::ExperienceLevel,
        crate::models::candidate::ProfileLinks,
        crate::models::candidate::SalaryExpectation,
        crate::models::candidate::VideoAnalysis,
        crate::models::job::Job,
        crate::models::job::JobStatus,
        crate::models::job::JobStats,
        crate::models::application::Application,
        crate::models::application::ApplicationStatus,
        crate::models::interview::Interview,
        crate::models::interview::InterviewStatus,
        crate::models::interview::InterviewFeedback,
        crate::models::interview::Recommendation,
        crate::models::user::Role,
        crate::services::worker_pool::ProcessingJob,
        crate::services::worker_pool::ProcessingJobType,
        crate::services::worker_pool::ProcessingStatus,
        crate::services::worker_pool::JobPriority,
        crate::services::ai_flows::GeneratedJobDescription,
        crate::services::ai_flows::ResumeSummary,
    )),
    modifiers(&BearerAuth),
    tags((name = "hiring", description = "Recruiting API"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

fn guarded(routes: Router<AppState>, state: &AppState, roles: &'static [Role]) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(
        RoleGuard::new(state.verifier.clone(), roles),
        require_roles,
    ))
}

/// Full API router with role guards, per-route timeouts and the rate limiter.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(health::openapi_json));

    let any_role = guarded(
        Router::new()
            .route("/api/candidates/:id", get(candidates::get_candidate))
            .route(
                "/api/candidates/:id/processing-jobs",
                get(candidates::list_processing_jobs),
            )
            .route("/api/processing/jobs/:id", get(processing::get_job_status))
            .route("/api/jobs", get(jobs::list_jobs))
            .route("/api/jobs/:id", get(jobs::get_job)),
        &state,
        Role::ALL,
    );

    let onboarding = guarded(
        Router::new().route("/api/candidates/onboarding", post(candidates::onboarding)),
        &state,
        ONBOARDING_ROLES,
    );

    let staff = guarded(
        Router::new()
            .route("/api/jobs", post(jobs::create_job))
            .route("/api/jobs/:id", patch(jobs::update_job))
            .route("/api/jobs/:id/status", post(jobs::set_job_status))
            .route("/api/jobs/:id/applications", get(applications::job_applications))
            .route("/api/interviews", post(interviews::schedule_interview))
            .route("/api/ai/job-description", post(ai::generate_job_description)),
        &state,
        Role::STAFF,
    );

    let candidate = guarded(
        Router::new()
            .route("/api/applications", post(applications::apply))
            .route("/api/applications/mine", get(applications::my_applications)),
        &state,
        CANDIDATE_ROLES,
    );

    let reviewers = guarded(
        Router::new().route(
            "/api/applications/:id/status",
            patch(applications::update_application_status),
        ),
        &state,
        REVIEWER_ROLES,
    );

    let interviewer = guarded(
        Router::new()
            .route("/api/interviews/mine", get(interviews::my_interviews))
            .route("/api/interviews/:id/feedback", post(interviews::submit_feedback)),
        &state,
        INTERVIEWER_ROLES,
    );

    let summaries = guarded(
        Router::new().route("/api/ai/resume-summary", post(ai::summarize_resume)),
        &state,
        SUMMARY_ROLES,
    );

    let timeouts = TimeoutPolicy::new(config.request_timeout())
        .route("/api/candidates/onboarding", config.ai_route_timeout())
        .route("/api/ai/**", config.ai_route_timeout());
    let limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_window());

    Router::new()
        .merge(public)
        .merge(any_role)
        .merge(onboarding)
        .merge(staff)
        .merge(candidate)
        .merge(reviewers)
        .merge(interviewer)
        .merge(summaries)
        .with_state(state)
        // Up to three base64 uploads per onboarding body.
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes * 4 + BODY_OVERHEAD_BYTES,
        ))
        .layer(from_fn_with_state(Arc::new(timeouts), timeout_middleware))
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
}
