use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::database::document_store::{self, SharedStore};
use crate::dto::interview_dto::{InterviewFeedbackPayload, ScheduleInterviewPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::application::ApplicationStatus;
use crate::models::interview::{Interview, InterviewFeedback, InterviewStatus, COLLECTION};
use crate::services::application_service::ApplicationService;
use crate::services::job_service::{JobService, StatsField};

const DEFAULT_DURATION_MINUTES: u32 = 45;

#[derive(Clone)]
pub struct InterviewService {
    store: SharedStore,
    applications: ApplicationService,
    jobs: JobService,
}

impl InterviewService {
    pub fn new(store: SharedStore, applications: ApplicationService, jobs: JobService) -> Self {
        Self {
            store,
            applications,
            jobs,
        }
    }

    pub async fn schedule(&self, user: &AuthUser, payload: ScheduleInterviewPayload) -> Result<Interview> {
        let application = self.applications.require(&payload.application_id).await?;
        user.ensure_company_access(&application.company_id)?;
        if matches!(
            application.status,
            ApplicationStatus::Hired | ApplicationStatus::Rejected
        ) {
            return Err(Error::BadRequest(
                "Application is already closed".to_string(),
            ));
        }
        if payload.scheduled_at <= Utc::now() {
            return Err(Error::BadRequest(
                "scheduledAt must be in the future".to_string(),
            ));
        }

        let now = Utc::now();
        let interview = Interview {
            id: Uuid::new_v4().to_string(),
            application_id: application.id.clone(),
            job_id: application.job_id.clone(),
            candidate_id: application.candidate_id.clone(),
            interviewer_id: payload.interviewer_id,
            company_id: application.company_id.clone(),
            scheduled_at: payload.scheduled_at,
            duration_minutes: payload.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            location: payload.location,
            meeting_url: payload.meeting_url,
            status: InterviewStatus::Scheduled,
            feedback: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        document_store::put(self.store.as_ref(), COLLECTION, &interview.id, &interview).await?;

        self.applications
            .set_status(&application, ApplicationStatus::Interviewed)
            .await?;
        self.jobs
            .bump_stats(&application.job_id, StatsField::Interviews)
            .await?;

        tracing::info!(
            interview_id = %interview.id,
            application_id = %application.id,
            interviewer_id = %interview.interviewer_id,
            "interview scheduled"
        );
        Ok(interview)
    }

    /// Interviews assigned to an interviewer, soonest first.
    pub async fn list_for_interviewer(&self, interviewer_id: &str) -> Result<Vec<Interview>> {
        let mut items: Vec<Interview> = document_store::fetch_where(
            self.store.as_ref(),
            COLLECTION,
            "interviewerId",
            json!(interviewer_id),
        )
        .await?;
        items.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(items)
    }

    pub async fn submit_feedback(
        &self,
        user: &AuthUser,
        id: &str,
        payload: InterviewFeedbackPayload,
    ) -> Result<Interview> {
        let interview: Interview = document_store::fetch(self.store.as_ref(), COLLECTION, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))?;
        if interview.interviewer_id != user.uid {
            return Err(Error::Forbidden(
                "Only the assigned interviewer can submit feedback".to_string(),
            ));
        }
        if interview.feedback.is_some() {
            return Err(Error::Conflict("Feedback already submitted".to_string()));
        }
        if interview.status == InterviewStatus::Cancelled {
            return Err(Error::BadRequest("Interview was cancelled".to_string()));
        }

        let now = Utc::now();
        let feedback = InterviewFeedback {
            rating: payload.rating,
            recommendation: payload.recommendation,
            notes: payload.notes,
            submitted_by: user.uid.clone(),
            submitted_at: now,
        };
        let merged = self
            .store
            .merge(
                COLLECTION,
                id,
                json!({
                    "feedback": feedback,
                    "status": InterviewStatus::Completed,
                    "updatedAt": now,
                }),
            )
            .await?;
        tracing::info!(interview_id = id, rating = feedback.rating, "interview feedback submitted");
        Ok(serde_json::from_value(merged)?)
    }
}
