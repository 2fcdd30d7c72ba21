use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::services::candidate_service::CandidateService;
use crate::services::orchestrator::{AiOrchestrator, Upload};
use crate::services::storage_service::StorageService;
use crate::services::worker_pool::{JobExecutor, ProcessingJob, ProcessingJobType};

/// Payload of resume/video jobs: where the upload was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUploadPayload {
    pub path: String,
    pub mime_type: String,
}

/// Runs queued candidate jobs through the orchestrator and merges the results.
pub struct CandidateJobExecutor {
    orchestrator: Arc<AiOrchestrator>,
    candidates: CandidateService,
    storage: StorageService,
}

impl CandidateJobExecutor {
    pub fn new(
        orchestrator: Arc<AiOrchestrator>,
        candidates: CandidateService,
        storage: StorageService,
    ) -> Self {
        Self {
            orchestrator,
            candidates,
            storage,
        }
    }

    async fn load_upload(&self, payload: &JsonValue) -> Result<Upload> {
        let stored: StoredUploadPayload = serde_json::from_value(payload.clone())
            .map_err(|e| Error::Internal(format!("malformed job payload: {}", e)))?;
        let data = self.storage.read(&stored.path).await?;
        Ok(Upload {
            data,
            mime_type: stored.mime_type,
        })
    }
}

#[async_trait]
impl JobExecutor for CandidateJobExecutor {
    async fn execute(&self, job: &ProcessingJob) -> Result<JsonValue> {
        let candidate_id = job.candidate_id.as_str();
        match job.job_type {
            ProcessingJobType::Resume => {
                let upload = self.load_upload(&job.payload).await?;
                let enrichment = self.orchestrator.process_resume(candidate_id, upload).await?;
                let profile = self
                    .candidates
                    .apply_enrichment(candidate_id, &enrichment, false)
                    .await?;
                Ok(json!({
                    "resumeSummary": profile.resume_summary,
                    "resumeHighlights": profile.resume_highlights,
                }))
            }
            ProcessingJobType::Video => {
                let upload = self.load_upload(&job.payload).await?;
                let enrichment = self.orchestrator.process_video(candidate_id, upload).await?;
                let profile = self
                    .candidates
                    .apply_enrichment(candidate_id, &enrichment, false)
                    .await?;
                Ok(json!({ "videoAnalysis": profile.video_analysis }))
            }
            ProcessingJobType::Profile => {
                let current = self.candidates.require(candidate_id).await?;
                let enrichment = self.orchestrator.generate_profile(&current).await?;
                let profile = self
                    .candidates
                    .apply_enrichment(candidate_id, &enrichment, true)
                    .await?;
                Ok(json!({
                    "profileComplete": profile.profile_complete,
                    "title": profile.title,
                    "experience": profile.experience,
                    "skills": profile.skills,
                    "summary": profile.resume_summary,
                }))
            }
        }
    }
}
