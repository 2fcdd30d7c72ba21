pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::database::SharedStore;
use crate::middleware::auth::JwtVerifier;
use crate::services::{
    ai_flows::AiFlows, ai_provider::AiProvider, application_service::ApplicationService,
    candidate_service::CandidateService, interview_service::InterviewService,
    job_service::JobService, onboarding_service::OnboardingService,
    orchestrator::AiOrchestrator, processing_executor::CandidateJobExecutor,
    storage_service::StorageService, worker_pool::AiWorkerPool,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: SharedStore,
    pub verifier: JwtVerifier,
    pub orchestrator: Arc<AiOrchestrator>,
    pub worker_pool: AiWorkerPool,
    pub candidate_service: CandidateService,
    pub onboarding_service: OnboardingService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
}

impl AppState {
    /// Wires the services and starts the AI worker; must run inside a Tokio runtime.
    pub fn new(config: Config, store: SharedStore, provider: Arc<dyn AiProvider>) -> Self {
        let orchestrator = Arc::new(AiOrchestrator::new(AiFlows::new(provider)));
        let storage = StorageService::new(config.storage_root.clone(), config.max_upload_bytes);
        let candidate_service = CandidateService::new(store.clone());
        let job_service = JobService::new(store.clone());

        let worker_pool = AiWorkerPool::start(Arc::new(CandidateJobExecutor::new(
            orchestrator.clone(),
            candidate_service.clone(),
            storage.clone(),
        )));
        let onboarding_service = OnboardingService::new(
            candidate_service.clone(),
            storage,
            orchestrator.clone(),
            worker_pool.clone(),
        );
        let application_service = ApplicationService::new(
            store.clone(),
            job_service.clone(),
            candidate_service.clone(),
            orchestrator.clone(),
        );
        let interview_service = InterviewService::new(
            store.clone(),
            application_service.clone(),
            job_service.clone(),
        );

        Self {
            verifier: JwtVerifier::new(&config.jwt_secret),
            config: Arc::new(config),
            store,
            orchestrator,
            worker_pool,
            candidate_service,
            onboarding_service,
            job_service,
            application_service,
            interview_service,
        }
    }
}
