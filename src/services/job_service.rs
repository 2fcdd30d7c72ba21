use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::database::document_store::{self, SharedStore};
use crate::dto::job_dto::{CreateJobPayload, JobListQuery, JobListResponse, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::job::{Job, JobStats, JobStatus, COLLECTION};
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsField {
    Applications,
    Interviews,
    Hires,
}

#[derive(Clone)]
pub struct JobService {
    store: SharedStore,
}

impl JobService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &AuthUser, payload: CreateJobPayload) -> Result<Job> {
        let company_id = match payload.company_id.as_deref() {
            Some(company) if user.is_super_admin() && !company.trim().is_empty() => {
                company.trim().to_string()
            }
            _ => user.require_company()?.to_string(),
        };

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            company_id,
            recruiter_id: user.uid.clone(),
            title: payload.title.trim().to_string(),
            department: payload.department,
            location: payload.location,
            employment_type: payload.employment_type,
            description: payload.description,
            requirements: payload.requirements,
            skills: payload.skills,
            status: payload.status.unwrap_or_default(),
            stats: JobStats::default(),
            embedding: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        document_store::put(self.store.as_ref(), COLLECTION, &job.id, &job).await?;
        tracing::info!(job_id = %job.id, company_id = %job.company_id, "job created");
        Ok(job)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Job>> {
        document_store::fetch(self.store.as_ref(), COLLECTION, id).await
    }

    pub async fn require(&self, id: &str) -> Result<Job> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    /// A job as the caller may see it: candidates only see active postings, staff
    /// only their own company's.
    pub async fn get_visible(&self, user: &AuthUser, id: &str) -> Result<Job> {
        let job = self.require(id).await?;
        let visible = if user.role == Role::Candidate {
            job.status == JobStatus::Active
        } else {
            user.can_access_company(&job.company_id)
        };
        if !visible {
            return Err(Error::NotFound(format!("Job {} not found", id)));
        }
        Ok(job)
    }

    pub async fn list(&self, user: &AuthUser, query: JobListQuery) -> Result<JobListResponse> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let search = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut jobs: Vec<Job> = match (user.role, user.company_id.as_deref()) {
            (Role::Candidate, _) | (Role::SuperAdmin, _) => {
                document_store::fetch_all(self.store.as_ref(), COLLECTION).await?
            }
            (_, Some(company)) => {
                document_store::fetch_where(self.store.as_ref(), COLLECTION, "companyId", json!(company))
                    .await?
            }
            (_, None) => Vec::new(),
        };

        jobs.retain(|job| {
            if user.role == Role::Candidate && job.status != JobStatus::Active {
                return false;
            }
            if let Some(status) = query.status {
                if job.status != status {
                    return false;
                }
            }
            if let Some(department) = query.department.as_deref() {
                if !job
                    .department
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(department))
                {
                    return false;
                }
            }
            match &search {
                Some(term) => {
                    job.title.to_lowercase().contains(term)
                        || job
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(term))
                        || job.skills.iter().any(|s| s.to_lowercase().contains(term))
                }
                None => true,
            }
        });
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = jobs.len() as i64;
        let offset = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let items: Vec<Job> = jobs
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .map(|mut job| {
                job.embedding.clear();
                job
            })
            .collect();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(JobListResponse {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn update(&self, user: &AuthUser, id: &str, payload: UpdateJobPayload) -> Result<Job> {
        let job = self.require(id).await?;
        user.ensure_company_access(&job.company_id)?;

        let mut patch = serde_json::to_value(&payload)?;
        if let Some(map) = patch.as_object_mut() {
            map.insert("updatedAt".to_string(), json!(Utc::now()));
            if payload.touches_matching_text() {
                // Stale once the posting text changes; recomputed on the next application.
                map.insert("embedding".to_string(), json!([]));
            }
        }
        let merged = self.store.merge(COLLECTION, id, patch).await?;
        tracing::info!(job_id = id, "job updated");
        Ok(serde_json::from_value(merged)?)
    }

    pub async fn set_status(&self, user: &AuthUser, id: &str, status: JobStatus) -> Result<Job> {
        let job = self.require(id).await?;
        user.ensure_company_access(&job.company_id)?;
        let merged = self
            .store
            .merge(
                COLLECTION,
                id,
                json!({ "status": status, "updatedAt": Utc::now() }),
            )
            .await?;
        tracing::info!(job_id = id, from = ?job.status, to = ?status, "job status changed");
        Ok(serde_json::from_value(merged)?)
    }

    /// Read-modify-write of one counter; concurrent bumps may lose an increment.
    pub async fn bump_stats(&self, id: &str, field: StatsField) -> Result<()> {
        let Some(job) = self.get(id).await? else {
            tracing::warn!(job_id = id, "stats bump for missing job");
            return Ok(());
        };
        let mut stats = job.stats;
        match field {
            StatsField::Applications => stats.applications += 1,
            StatsField::Interviews => stats.interviews += 1,
            StatsField::Hires => stats.hires += 1,
        }
        self.store
            .merge(COLLECTION, id, json!({ "stats": stats }))
            .await?;
        Ok(())
    }

    pub async fn cache_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        self.store
            .merge(COLLECTION, id, json!({ "embedding": embedding }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDocumentStore;
    use std::sync::Arc;

    fn service() -> JobService {
        JobService::new(Arc::new(MemoryDocumentStore::new()))
    }

    fn user(role: Role, company: Option<&str>) -> AuthUser {
        AuthUser {
            uid: format!("{}-uid", role),
            role,
            company_id: company.map(str::to_string),
            email: None,
        }
    }

    fn create_payload(title: &str, status: Option<JobStatus>) -> CreateJobPayload {
        CreateJobPayload {
            title: title.into(),
            department: Some("Engineering".into()),
            location: None,
            employment_type: None,
            description: Some("Build backend services".into()),
            requirements: vec![],
            skills: vec!["Rust".into()],
            status,
            company_id: None,
        }
    }

    #[tokio::test]
    async fn new_jobs_are_drafts_owned_by_the_callers_company() {
        let svc = service();
        let recruiter = user(Role::Recruiter, Some("co1"));
        let job = svc.create(&recruiter, create_payload("Rust dev", None)).await.unwrap();
        assert_eq!(job.status, JobStatus::Draft);
        assert_eq!(job.company_id, "co1");
        assert_eq!(job.recruiter_id, recruiter.uid);

        let no_company = user(Role::Recruiter, None);
        assert!(matches!(
            svc.create(&no_company, create_payload("x", None)).await,
            Err(Error::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn listing_scopes_by_role_and_filters() {
        let svc = service();
        let co1 = user(Role::Recruiter, Some("co1"));
        let co2 = user(Role::CompanyAdmin, Some("co2"));
        svc.create(&co1, create_payload("Rust dev", Some(JobStatus::Active))).await.unwrap();
        svc.create(&co1, create_payload("Go dev", None)).await.unwrap();
        svc.create(&co2, create_payload("Rust lead", Some(JobStatus::Active))).await.unwrap();

        let staff = svc.list(&co1, JobListQuery::default()).await.unwrap();
        assert_eq!(staff.total, 2);

        let candidate = user(Role::Candidate, None);
        let visible = svc.list(&candidate, JobListQuery::default()).await.unwrap();
        assert_eq!(visible.total, 2);
        assert!(visible.items.iter().all(|j| j.status == JobStatus::Active));

        let searched = svc
            .list(
                &candidate,
                JobListQuery {
                    search: Some("lead".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.items[0].title, "Rust lead");

        let paged = svc
            .list(
                &user(Role::SuperAdmin, None),
                JobListQuery {
                    page: Some(2),
                    per_page: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(paged.total, 3);
        assert_eq!(paged.total_pages, 2);
        assert_eq!(paged.items.len(), 1);
    }

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let svc = service();
        let admin = user(Role::SuperAdmin, None);
        svc.create(&user(Role::Recruiter, Some("co1")), create_payload("Rust dev", None))
            .await
            .unwrap();

        let far = svc
            .list(
                &admin,
                JobListQuery {
                    page: Some(i64::MAX),
                    per_page: Some(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(far.total, 1);
        assert_eq!(far.page, i64::MAX);
        assert!(far.items.is_empty());
    }

    #[tokio::test]
    async fn other_companies_cannot_edit_and_drafts_stay_hidden() {
        let svc = service();
        let owner = user(Role::Recruiter, Some("co1"));
        let job = svc.create(&owner, create_payload("Rust dev", None)).await.unwrap();

        let outsider = user(Role::Recruiter, Some("co2"));
        assert!(matches!(
            svc.set_status(&outsider, &job.id, JobStatus::Active).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            svc.get_visible(&user(Role::Candidate, None), &job.id).await,
            Err(Error::NotFound(_))
        ));

        let updated = svc
            .update(
                &owner,
                &job.id,
                UpdateJobPayload {
                    title: Some("Senior Rust dev".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Senior Rust dev");
        assert_eq!(updated.skills, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn stats_bumps_accumulate() {
        let svc = service();
        let owner = user(Role::Recruiter, Some("co1"));
        let job = svc.create(&owner, create_payload("Rust dev", None)).await.unwrap();
        svc.bump_stats(&job.id, StatsField::Applications).await.unwrap();
        svc.bump_stats(&job.id, StatsField::Applications).await.unwrap();
        svc.bump_stats(&job.id, StatsField::Hires).await.unwrap();
        let stats = svc.require(&job.id).await.unwrap().stats;
        assert_eq!(stats.applications, 2);
        assert_eq!(stats.hires, 1);
        assert_eq!(stats.interviews, 0);
        svc.bump_stats("missing", StatsField::Hires).await.unwrap();
    }
}
