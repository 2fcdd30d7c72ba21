use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::database::document_store::{self, SharedStore};
use crate::dto::application_dto::ApplyPayload;
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::application::{Application, ApplicationStatus, COLLECTION};
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::services::candidate_service::CandidateService;
use crate::services::job_service::{JobService, StatsField};
use crate::services::orchestrator::{similarity_score, AiOrchestrator};

#[derive(Clone)]
pub struct ApplicationService {
    store: SharedStore,
    jobs: JobService,
    candidates: CandidateService,
    orchestrator: Arc<AiOrchestrator>,
}

impl ApplicationService {
    pub fn new(
        store: SharedStore,
        jobs: JobService,
        candidates: CandidateService,
        orchestrator: Arc<AiOrchestrator>,
    ) -> Self {
        Self {
            store,
            jobs,
            candidates,
            orchestrator,
        }
    }

    pub async fn apply(&self, user: &AuthUser, payload: ApplyPayload) -> Result<Application> {
        let job = self.jobs.require(&payload.job_id).await?;
        if !job.status.accepts_applications() {
            return Err(Error::BadRequest(
                "Job is not accepting applications".to_string(),
            ));
        }
        let candidate = self
            .candidates
            .get(&user.uid)
            .await?
            .ok_or_else(|| Error::NotFound("Complete onboarding before applying".to_string()))?;

        let existing: Vec<Application> = document_store::fetch_where(
            self.store.as_ref(),
            COLLECTION,
            "candidateId",
            json!(user.uid),
        )
        .await?;
        if existing.iter().any(|a| a.job_id == job.id) {
            return Err(Error::Conflict("Already applied to this job".to_string()));
        }

        let match_score = self.match_score(&candidate, &job).await;
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            candidate_id: user.uid.clone(),
            company_id: job.company_id.clone(),
            status: ApplicationStatus::Pending,
            match_score,
            cover_letter: payload.cover_letter,
            created_at: Some(now),
            updated_at: Some(now),
        };
        document_store::put(self.store.as_ref(), COLLECTION, &application.id, &application).await?;
        self.jobs.bump_stats(&job.id, StatsField::Applications).await?;

        tracing::info!(
            application_id = %application.id,
            job_id = %job.id,
            candidate_id = %user.uid,
            match_score = ?match_score,
            "application submitted"
        );
        Ok(application)
    }

    /// `None` when the candidate has no embedding yet or the embedding call fails;
    /// scoring never blocks an application.
    async fn match_score(&self, candidate: &CandidateProfile, job: &Job) -> Option<u8> {
        if candidate.embedding.is_empty() {
            return None;
        }
        let job_embedding = match self.orchestrator.job_embedding(job).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "match score skipped");
                return None;
            }
        };
        if job.embedding.is_empty() {
            if let Err(e) = self.jobs.cache_embedding(&job.id, &job_embedding).await {
                tracing::warn!(job_id = %job.id, error = %e, "failed to cache job embedding");
            }
        }
        Some(similarity_score(&candidate.embedding, &job_embedding))
    }

    pub async fn list_for_candidate(&self, candidate_id: &str) -> Result<Vec<Application>> {
        let mut items: Vec<Application> = document_store::fetch_where(
            self.store.as_ref(),
            COLLECTION,
            "candidateId",
            json!(candidate_id),
        )
        .await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// Applications of one job, best match first.
    pub async fn list_for_job(&self, user: &AuthUser, job_id: &str) -> Result<Vec<Application>> {
        let job = self.jobs.require(job_id).await?;
        user.ensure_company_access(&job.company_id)?;
        let mut items: Vec<Application> =
            document_store::fetch_where(self.store.as_ref(), COLLECTION, "jobId", json!(job_id))
                .await?;
        items.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Ok(items)
    }

    pub async fn require(&self, id: &str) -> Result<Application> {
        document_store::fetch(self.store.as_ref(), COLLECTION, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }

    pub async fn update_status(
        &self,
        user: &AuthUser,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let application = self.require(id).await?;
        user.ensure_company_access(&application.company_id)?;
        let updated = self.set_status(&application, status).await?;
        tracing::info!(
            application_id = id,
            from = ?application.status,
            to = ?status,
            by = %user.uid,
            "application status changed"
        );
        Ok(updated)
    }

    pub(crate) async fn set_status(
        &self,
        application: &Application,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let merged = self
            .store
            .merge(
                COLLECTION,
                &application.id,
                json!({ "status": status, "updatedAt": Utc::now() }),
            )
            .await?;
        if status == ApplicationStatus::Hired && application.status != ApplicationStatus::Hired {
            self.jobs.bump_stats(&application.job_id, StatsField::Hires).await?;
        }
        Ok(serde_json::from_value(merged)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDocumentStore;
    use crate::dto::job_dto::CreateJobPayload;
    use crate::models::job::JobStatus;
    use crate::models::user::Role;
    use crate::services::ai_flows::AiFlows;
    use crate::services::ai_provider::MockAiProvider;
    use crate::services::orchestrator::ProfileEnrichment;

    struct Fixture {
        apps: ApplicationService,
        jobs: JobService,
        candidates: CandidateService,
    }

    fn fixture(mock: MockAiProvider) -> Fixture {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let jobs = JobService::new(store.clone());
        let candidates = CandidateService::new(store.clone());
        let orchestrator = Arc::new(AiOrchestrator::new(AiFlows::new(Arc::new(mock))));
        Fixture {
            apps: ApplicationService::new(store, jobs.clone(), candidates.clone(), orchestrator),
            jobs,
            candidates,
        }
    }

    fn user(uid: &str, role: Role, company: Option<&str>) -> AuthUser {
        AuthUser {
            uid: uid.into(),
            role,
            company_id: company.map(str::to_string),
            email: None,
        }
    }

    async fn active_job(jobs: &JobService) -> Job {
        jobs.create(
            &user("r1", Role::Recruiter, Some("co1")),
            CreateJobPayload {
                title: "Rust dev".into(),
                department: None,
                location: None,
                employment_type: None,
                description: None,
                requirements: vec![],
                skills: vec![],
                status: Some(JobStatus::Active),
                company_id: None,
            },
        )
        .await
        .unwrap()
    }

    async fn onboarded(candidates: &CandidateService, uid: &str, embedding: Vec<f32>) {
        candidates
            .apply_enrichment(
                uid,
                &ProfileEnrichment {
                    embedding: Some(embedding),
                    ..Default::default()
                },
                true,
            )
            .await
            .unwrap();
    }

    fn apply_payload(job_id: &str) -> ApplyPayload {
        ApplyPayload {
            job_id: job_id.into(),
            cover_letter: None,
        }
    }

    #[tokio::test]
    async fn apply_scores_caches_embedding_and_rejects_duplicates() {
        let mut mock = MockAiProvider::new();
        mock.expect_embed()
            .times(1)
            .returning(|_| Ok(vec![vec![1.0, 0.0]]));
        let fx = fixture(mock);
        let job = active_job(&fx.jobs).await;
        onboarded(&fx.candidates, "c1", vec![1.0, 0.0]).await;
        let candidate = user("c1", Role::Candidate, None);

        let app = fx.apps.apply(&candidate, apply_payload(&job.id)).await.unwrap();
        assert_eq!(app.match_score, Some(100));
        assert_eq!(app.company_id, "co1");

        let stored = fx.jobs.require(&job.id).await.unwrap();
        assert_eq!(stored.embedding, vec![1.0, 0.0]);
        assert_eq!(stored.stats.applications, 1);

        assert!(matches!(
            fx.apps.apply(&candidate, apply_payload(&job.id)).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn apply_requires_an_open_job_and_a_profile() {
        let mut mock = MockAiProvider::new();
        mock.expect_embed().never();
        let fx = fixture(mock);
        let candidate = user("c1", Role::Candidate, None);

        assert!(matches!(
            fx.apps.apply(&candidate, apply_payload("nope")).await,
            Err(Error::NotFound(_))
        ));

        let job = active_job(&fx.jobs).await;
        assert!(matches!(
            fx.apps.apply(&candidate, apply_payload(&job.id)).await,
            Err(Error::NotFound(_))
        ));

        fx.jobs
            .set_status(&user("r1", Role::Recruiter, Some("co1")), &job.id, JobStatus::Closed)
            .await
            .unwrap();
        assert!(matches!(
            fx.apps.apply(&candidate, apply_payload(&job.id)).await,
            Err(Error::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn hiring_bumps_job_stats_once() {
        let mut mock = MockAiProvider::new();
        mock.expect_embed().never();
        let fx = fixture(mock);
        let job = active_job(&fx.jobs).await;
        fx.candidates
            .save_basics("c1", &Default::default())
            .await
            .unwrap();
        let app = fx
            .apps
            .apply(&user("c1", Role::Candidate, None), apply_payload(&job.id))
            .await
            .unwrap();
        assert_eq!(app.match_score, None);

        let recruiter = user("r1", Role::Recruiter, Some("co1"));
        fx.apps.update_status(&recruiter, &app.id, ApplicationStatus::Hired).await.unwrap();
        fx.apps.update_status(&recruiter, &app.id, ApplicationStatus::Hired).await.unwrap();
        assert_eq!(fx.jobs.require(&job.id).await.unwrap().stats.hires, 1);

        let outsider = user("r2", Role::Recruiter, Some("co2"));
        assert!(matches!(
            fx.apps.update_status(&outsider, &app.id, ApplicationStatus::Rejected).await,
            Err(Error::Forbidden(_))
        ));
    }
}
