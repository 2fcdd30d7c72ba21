use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::document_store::{self, SharedStore};
use crate::error::{Error, Result};
use crate::models::candidate::{
    CandidateProfile, ExperienceLevel, ProfileLinks, SalaryExpectation, COLLECTION,
};
use crate::services::orchestrator::ProfileEnrichment;

/// Basic, user-supplied candidate fields plus upload bookkeeping. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<ProfileLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_expectation: Option<SalaryExpectation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_uploaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_intro_recorded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Timestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_complete: Option<bool>,
}

#[derive(Clone)]
pub struct CandidateService {
    store: SharedStore,
}

impl CandidateService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CandidateProfile>> {
        document_store::fetch(self.store.as_ref(), COLLECTION, id).await
    }

    pub async fn require(&self, id: &str) -> Result<CandidateProfile> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))
    }

    /// Writes the basic fields, creating the profile on first use.
    pub async fn save_basics(&self, id: &str, patch: &CandidatePatch) -> Result<CandidateProfile> {
        let is_new = self.store.get(COLLECTION, id).await?.is_none();
        let now = Utc::now();
        let mut doc = serde_json::to_value(patch)?;
        merge_into(
            &mut doc,
            serde_json::to_value(Timestamps {
                created_at: is_new.then_some(now),
                updated_at: now,
                profile_complete: is_new.then_some(false),
            })?,
        );
        let merged = self.store.merge(COLLECTION, id, doc).await?;
        tracing::info!(candidate_id = id, is_new, "candidate basics saved");
        Ok(serde_json::from_value(merged)?)
    }

    /// Merges AI output into the profile; `complete` also flips `profileComplete`.
    pub async fn apply_enrichment(
        &self,
        id: &str,
        enrichment: &ProfileEnrichment,
        complete: bool,
    ) -> Result<CandidateProfile> {
        let mut doc = serde_json::to_value(enrichment)?;
        merge_into(
            &mut doc,
            serde_json::to_value(Timestamps {
                created_at: None,
                updated_at: Utc::now(),
                profile_complete: complete.then_some(true),
            })?,
        );
        let merged = self.store.merge(COLLECTION, id, doc).await?;
        tracing::info!(candidate_id = id, complete, "candidate enrichment saved");
        Ok(serde_json::from_value(merged)?)
    }
}

fn merge_into(target: &mut serde_json::Value, extra: serde_json::Value) {
    if let (Some(target), serde_json::Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}
