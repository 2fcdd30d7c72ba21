//! In-process AI job queue.
//!
//! Jobs live only in this process: a restart loses them. One background task drains
//! the queue in enqueue order; priority is recorded for reporting only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingJobType {
    Resume,
    Video,
    Profile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: ProcessingJobType,
    pub priority: JobPriority,
    pub candidate_id: String,
    pub status: ProcessingStatus,
    #[serde(skip)]
    pub payload: JsonValue,
    #[schema(value_type = Option<Object>)]
    pub result: Option<JsonValue>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_type: ProcessingJobType,
    pub priority: JobPriority,
    pub candidate_id: String,
    pub payload: JsonValue,
}

#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &ProcessingJob) -> Result<JsonValue>;
}

type JobTable = Arc<RwLock<HashMap<Uuid, ProcessingJob>>>;

#[derive(Clone)]
pub struct AiWorkerPool {
    jobs: JobTable,
    sender: mpsc::UnboundedSender<Uuid>,
}

impl AiWorkerPool {
    /// Spawns the worker task on the current Tokio runtime.
    pub fn start(executor: Arc<dyn JobExecutor>) -> Self {
        let jobs: JobTable = Arc::new(RwLock::new(HashMap::new()));
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(jobs.clone(), receiver, executor));
        Self { jobs, sender }
    }

    pub async fn enqueue(&self, request: JobRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let job = ProcessingJob {
            id,
            job_type: request.job_type,
            priority: request.priority,
            candidate_id: request.candidate_id,
            status: ProcessingStatus::Pending,
            payload: request.payload,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        tracing::info!(
            job_id = %id,
            job_type = ?job.job_type,
            priority = ?job.priority,
            candidate_id = %job.candidate_id,
            "AI job enqueued"
        );
        self.jobs.write().await.insert(id, job);
        if self.sender.send(id).is_err() {
            self.jobs.write().await.remove(&id);
            return Err(Error::Internal("AI worker is not running".to_string()));
        }
        Ok(id)
    }

    pub async fn get_job_status(&self, id: Uuid) -> Option<ProcessingJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// A candidate's jobs, newest first.
    pub async fn jobs_for_candidate(&self, candidate_id: &str) -> Vec<ProcessingJob> {
        let mut jobs: Vec<ProcessingJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.candidate_id == candidate_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

async fn run_worker(
    jobs: JobTable,
    mut receiver: mpsc::UnboundedReceiver<Uuid>,
    executor: Arc<dyn JobExecutor>,
) {
    tracing::info!("AI worker started");
    while let Some(id) = receiver.recv().await {
        let job = {
            let mut guard = jobs.write().await;
            let Some(job) = guard.get_mut(&id) else {
                continue;
            };
            job.status = ProcessingStatus::Processing;
            job.started_at = Some(Utc::now());
            job.clone()
        };

        let outcome = executor.execute(&job).await;

        let mut guard = jobs.write().await;
        let Some(entry) = guard.get_mut(&id) else {
            continue;
        };
        entry.finished_at = Some(Utc::now());
        match outcome {
            Ok(result) => {
                entry.status = ProcessingStatus::Completed;
                entry.result = Some(result);
                tracing::info!(job_id = %id, job_type = ?entry.job_type, "AI job completed");
            }
            Err(e) => {
                entry.status = ProcessingStatus::Failed;
                entry.error = Some(e.to_string());
                tracing::error!(job_id = %id, job_type = ?entry.job_type, error = %e, "AI job failed");
            }
        }
    }
    tracing::info!("AI worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingExecutor {
        seen: Mutex<Vec<ProcessingJobType>>,
    }

    #[async_trait]
    impl JobExecutor for RecordingExecutor {
        async fn execute(&self, job: &ProcessingJob) -> Result<JsonValue> {
            self.seen.lock().unwrap().push(job.job_type);
            if job.payload.get("fail").is_some() {
                return Err(Error::Ai("boom".into()));
            }
            Ok(json!({ "ok": true }))
        }
    }

    async fn wait_finished(pool: &AiWorkerPool, id: Uuid) -> ProcessingJob {
        for _ in 0..200 {
            if let Some(job) = pool.get_job_status(id).await {
                if job.status.is_finished() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }

    fn request(job_type: ProcessingJobType, priority: JobPriority, payload: JsonValue) -> JobRequest {
        JobRequest {
            job_type,
            priority,
            candidate_id: "c1".into(),
            payload,
        }
    }

    #[tokio::test]
    async fn runs_jobs_in_enqueue_order_regardless_of_priority() {
        let executor = Arc::new(RecordingExecutor {
            seen: Mutex::new(Vec::new()),
        });
        let pool = AiWorkerPool::start(executor.clone());

        let a = pool
            .enqueue(request(ProcessingJobType::Video, JobPriority::Low, json!({})))
            .await
            .unwrap();
        let b = pool
            .enqueue(request(ProcessingJobType::Resume, JobPriority::High, json!({})))
            .await
            .unwrap();
        wait_finished(&pool, a).await;
        let done = wait_finished(&pool, b).await;

        assert_eq!(done.status, ProcessingStatus::Completed);
        assert_eq!(done.result, Some(json!({ "ok": true })));
        assert_eq!(
            *executor.seen.lock().unwrap(),
            vec![ProcessingJobType::Video, ProcessingJobType::Resume]
        );
    }

    #[tokio::test]
    async fn failures_are_recorded_without_touching_other_jobs() {
        let executor = Arc::new(RecordingExecutor {
            seen: Mutex::new(Vec::new()),
        });
        let pool = AiWorkerPool::start(executor);

        let ok = pool
            .enqueue(request(ProcessingJobType::Profile, JobPriority::Medium, json!({})))
            .await
            .unwrap();
        let ok_job = wait_finished(&pool, ok).await;

        let bad = pool
            .enqueue(request(ProcessingJobType::Profile, JobPriority::Medium, json!({ "fail": true })))
            .await
            .unwrap();
        let bad_job = wait_finished(&pool, bad).await;

        assert_eq!(bad_job.status, ProcessingStatus::Failed);
        assert!(bad_job.error.unwrap().contains("boom"));

        let again = pool.get_job_status(ok).await.unwrap();
        assert_eq!(again.status, ok_job.status);
        assert_eq!(again.finished_at, ok_job.finished_at);
        assert_eq!(pool.jobs_for_candidate("c1").await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_ids_have_no_status() {
        let executor = Arc::new(RecordingExecutor {
            seen: Mutex::new(Vec::new()),
        });
        let pool = AiWorkerPool::start(executor);
        assert!(pool.get_job_status(Uuid::new_v4()).await.is_none());
    }
}
