pub mod ai_flows;
pub mod ai_provider;
pub mod application_service;
pub mod candidate_service;
pub mod interview_service;
pub mod job_service;
pub mod onboarding_service;
pub mod orchestrator;
pub mod processing_executor;
pub mod storage_service;
pub mod worker_pool;
