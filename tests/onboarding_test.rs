mod common;

use axum::http::StatusCode;
use common::{mp4_base64, pdf_base64, spawn_app, token, ScriptedProvider};
use hiring_backend::services::ai_flows::FLOW_PROFILE;
use serde_json::json;

#[tokio::test]
async fn high_priority_onboarding_completes_profile_inline() {
    let app = spawn_app(ScriptedProvider::default());
    let candidate = token("c1", "candidate", None);

    let res = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({
                "candidateId": "c1",
                "priority": "high",
                "resumeFile": pdf_base64(),
                "resumeMimeType": "application/pdf",
                "skills": ["Go"]
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["success"], true);
    let data = &res.body["data"];
    assert_eq!(data["candidateId"], "c1");
    assert_eq!(data["profileComplete"], true);
    assert_eq!(data["processingQueued"], false);
    assert_eq!(data["profile"]["title"], "Backend Engineer");
    assert_eq!(data["profile"]["skills"], json!(["Go", "Rust", "PostgreSQL"]));
    assert!(data["profile"].get("embedding").is_none());
    assert!(data["profile"].get("resumeText").is_none());

    let stored = app.state.candidate_service.require("c1").await.unwrap();
    assert!(stored.profile_complete);
    assert!(stored.resume_uploaded);
    assert!(stored
        .resume_path
        .as_deref()
        .unwrap()
        .starts_with("candidates/c1/resume/"));
    assert_eq!(stored.experience.map(|e| format!("{:?}", e)), Some("Senior".into()));
    assert!(stored.resume_summary.is_some());
    assert!(!stored.embedding.is_empty());
    assert!(stored.ai_processed_at.is_some());
}

#[tokio::test]
async fn high_priority_ai_failure_keeps_only_basic_fields() {
    let app = spawn_app(ScriptedProvider::failing(&[FLOW_PROFILE]));
    let candidate = token("c2", "candidate", None);

    let res = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({
                "candidateId": "c2",
                "priority": "high",
                "title": "Data Analyst",
                "resumeFile": pdf_base64(),
                "resumeMimeType": "application/pdf"
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body["error"].is_string());

    let stored = app.state.candidate_service.require("c2").await.unwrap();
    assert_eq!(stored.title.as_deref(), Some("Data Analyst"));
    assert!(!stored.profile_complete);
    assert!(stored.resume_summary.is_none());
    assert!(stored.embedding.is_empty());
    assert!(stored.ai_processed_at.is_none());
    assert!(stored.resume_text.is_none());
}

#[tokio::test]
async fn queued_onboarding_returns_one_job_per_upload_plus_profile() {
    let app = spawn_app(ScriptedProvider::default());
    let candidate = token("c3", "candidate", None);

    let res = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({
                "candidateId": "c3",
                "priority": "low",
                "resumeFile": pdf_base64(),
                "resumeMimeType": "application/pdf",
                "videoFile": mp4_base64(),
                "videoMimeType": "video/mp4"
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let data = &res.body["data"];
    assert_eq!(data["profileComplete"], false);
    assert_eq!(data["processingQueued"], true);
    let job_ids: Vec<String> = data["jobIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap().to_string())
        .collect();
    assert_eq!(job_ids.len(), 3);

    for id in &job_ids {
        let job = app.wait_for_job(id, &candidate).await;
        assert_eq!(job["status"], "completed", "{}", job);
        assert_eq!(job["priority"], "low");
    }

    let profile = app.get("/api/candidates/c3", Some(&candidate)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["profileComplete"], true);
    assert_eq!(profile.body["videoIntroRecorded"], true);
    assert_eq!(profile.body["videoAnalysis"]["communicationScore"], 81);

    let jobs = app.get("/api/candidates/c3/processing-jobs", Some(&candidate)).await;
    assert_eq!(jobs.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn medium_priority_without_uploads_queues_profile_job_only() {
    let app = spawn_app(ScriptedProvider::default());
    let candidate = token("c4", "candidate", None);

    let res = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({ "candidateId": "c4", "title": "QA Engineer", "skills": ["Selenium"] }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["jobIds"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_processing_job_is_not_found() {
    let app = spawn_app(ScriptedProvider::default());
    let res = app
        .get(
            &format!("/api/processing/jobs/{}", uuid::Uuid::new_v4()),
            Some(&token("c1", "candidate", None)),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let malformed = app
        .get("/api/processing/jobs/not-a-job", Some(&token("c1", "candidate", None)))
        .await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
    assert!(malformed.body["error"].as_str().unwrap().contains("not-a-job"));
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = spawn_app(ScriptedProvider::default());
    let candidate = token("c9", "candidate", None);

    let wrong_type = app
        .post("/api/candidates/onboarding", Some(&candidate), json!({ "candidateId": 5 }))
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert!(wrong_type.body["error"]
        .as_str()
        .unwrap()
        .contains("candidateId"));

    let bad_query = app.get("/api/jobs?page=abc", Some(&candidate)).await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert!(bad_query.body["error"].is_string());
}

#[tokio::test]
async fn onboarding_rejects_foreign_ids_and_bad_uploads() {
    let app = spawn_app(ScriptedProvider::default());
    let candidate = token("c5", "candidate", None);

    let foreign = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({ "candidateId": "someone-else" }),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let spoofed = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({
                "candidateId": "c5",
                "resumeFile": mp4_base64(),
                "resumeMimeType": "application/pdf"
            }),
        )
        .await;
    assert_eq!(spoofed.status, StatusCode::BAD_REQUEST);

    let disallowed = app
        .post(
            "/api/candidates/onboarding",
            Some(&candidate),
            json!({
                "candidateId": "c5",
                "videoFile": mp4_base64(),
                "videoMimeType": "video/x-msvideo"
            }),
        )
        .await;
    assert_eq!(disallowed.status, StatusCode::BAD_REQUEST);
    assert!(app.provider.calls().is_empty());
}

#[tokio::test]
async fn candidates_cannot_read_each_other() {
    let app = spawn_app(ScriptedProvider::default());
    app.post(
        "/api/candidates/onboarding",
        Some(&token("c6", "candidate", None)),
        json!({ "candidateId": "c6", "title": "Designer" }),
    )
    .await;

    let other = app.get("/api/candidates/c6", Some(&token("c7", "candidate", None))).await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let recruiter = app
        .get("/api/candidates/c6", Some(&token("r1", "recruiter", Some("co1"))))
        .await;
    assert_eq!(recruiter.status, StatusCode::OK);
    assert_eq!(recruiter.body["title"], "Designer");
}
