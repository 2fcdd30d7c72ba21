//! Candidate onboarding: stores uploads and basic details, then either runs the AI
//! pipeline inline (`high` priority) or hands the work to the worker pool.

use std::sync::Arc;

use uuid::Uuid;

use crate::dto::onboarding_dto::{DecodedFile, OnboardingData, OnboardingPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::services::candidate_service::{CandidatePatch, CandidateService};
use crate::services::orchestrator::{AiOrchestrator, EnrichmentInputs, Upload};
use crate::services::processing_executor::StoredUploadPayload;
use crate::services::storage_service::{StorageService, StoredObject, UploadKind};
use crate::services::worker_pool::{AiWorkerPool, JobPriority, JobRequest, ProcessingJobType};

#[derive(Clone)]
pub struct OnboardingService {
    candidates: CandidateService,
    storage: StorageService,
    orchestrator: Arc<AiOrchestrator>,
    workers: AiWorkerPool,
}

impl OnboardingService {
    pub fn new(
        candidates: CandidateService,
        storage: StorageService,
        orchestrator: Arc<AiOrchestrator>,
        workers: AiWorkerPool,
    ) -> Self {
        Self {
            candidates,
            storage,
            orchestrator,
            workers,
        }
    }

    pub async fn onboard(&self, user: &AuthUser, payload: OnboardingPayload) -> Result<OnboardingData> {
        let candidate_id = payload.candidate_id.trim().to_string();
        if candidate_id != user.uid && !user.is_super_admin() {
            return Err(Error::Forbidden(
                "candidateId must match the authenticated user".to_string(),
            ));
        }

        let resume = payload.resume()?;
        let video = payload.video()?;
        let picture = payload.picture()?;

        let mut patch = payload.basics();
        let stored_resume = self
            .store_upload(UploadKind::Resume, &candidate_id, resume.as_ref())
            .await?;
        let stored_video = self
            .store_upload(UploadKind::IntroVideo, &candidate_id, video.as_ref())
            .await?;
        let stored_picture = self
            .store_upload(UploadKind::ProfilePicture, &candidate_id, picture.as_ref())
            .await?;
        apply_stored(&mut patch, &stored_resume, &stored_video, &stored_picture);

        self.candidates.save_basics(&candidate_id, &patch).await?;

        match payload.priority {
            JobPriority::High => {
                let inputs = EnrichmentInputs {
                    resume: resume.map(to_upload),
                    video: video.map(to_upload),
                };
                let enrichment = self
                    .orchestrator
                    .enrich_candidate(&candidate_id, &payload.hints(), inputs)
                    .await
                    .map_err(|e| {
                        tracing::error!(candidate_id = %candidate_id, error = %e, "synchronous enrichment failed");
                        e
                    })?;
                let profile = self
                    .candidates
                    .apply_enrichment(&candidate_id, &enrichment, true)
                    .await?;
                Ok(OnboardingData {
                    candidate_id,
                    profile_complete: true,
                    processing_queued: false,
                    job_ids: None,
                    profile: Some(profile.redacted()),
                })
            }
            priority => {
                let mut job_ids = Vec::new();
                if let Some(stored) = &stored_resume {
                    job_ids.push(
                        self.enqueue_upload(ProcessingJobType::Resume, priority, &candidate_id, stored)
                            .await?,
                    );
                }
                if let Some(stored) = &stored_video {
                    job_ids.push(
                        self.enqueue_upload(ProcessingJobType::Video, priority, &candidate_id, stored)
                            .await?,
                    );
                }
                job_ids.push(
                    self.workers
                        .enqueue(JobRequest {
                            job_type: ProcessingJobType::Profile,
                            priority,
                            candidate_id: candidate_id.clone(),
                            payload: serde_json::json!({}),
                        })
                        .await?,
                );
                tracing::info!(candidate_id = %candidate_id, jobs = job_ids.len(), "onboarding queued");
                Ok(OnboardingData {
                    candidate_id,
                    profile_complete: false,
                    processing_queued: true,
                    job_ids: Some(job_ids),
                    profile: None,
                })
            }
        }
    }

    async fn store_upload(
        &self,
        kind: UploadKind,
        uid: &str,
        file: Option<&DecodedFile>,
    ) -> Result<Option<StoredObject>> {
        match file {
            Some(file) => Ok(Some(
                self.storage.store(kind, uid, &file.mime_type, &file.data).await?,
            )),
            None => Ok(None),
        }
    }

    async fn enqueue_upload(
        &self,
        job_type: ProcessingJobType,
        priority: JobPriority,
        candidate_id: &str,
        stored: &StoredObject,
    ) -> Result<Uuid> {
        let payload = serde_json::to_value(StoredUploadPayload {
            path: stored.path.clone(),
            mime_type: stored.mime_type.clone(),
        })?;
        self.workers
            .enqueue(JobRequest {
                job_type,
                priority,
                candidate_id: candidate_id.to_string(),
                payload,
            })
            .await
    }
}

fn to_upload(file: DecodedFile) -> Upload {
    Upload {
        data: file.data,
        mime_type: file.mime_type,
    }
}

fn apply_stored(
    patch: &mut CandidatePatch,
    resume: &Option<StoredObject>,
    video: &Option<StoredObject>,
    picture: &Option<StoredObject>,
) {
    if let Some(resume) = resume {
        patch.resume_uploaded = Some(true);
        patch.resume_path = Some(resume.path.clone());
        patch.resume_mime_type = Some(resume.mime_type.clone());
        patch.resume_sha256 = Some(resume.sha256.clone());
    }
    if let Some(video) = video {
        patch.video_intro_recorded = Some(true);
        patch.video_path = Some(video.path.clone());
        patch.video_mime_type = Some(video.mime_type.clone());
    }
    if let Some(picture) = picture {
        patch.photo_path = Some(picture.path.clone());
    }
}
