pub mod ai_dto;
pub mod application_dto;
pub mod interview_dto;
pub mod job_dto;
pub mod onboarding_dto;
