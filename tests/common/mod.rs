#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hiring_backend::{
    config::Config,
    database::MemoryDocumentStore,
    error::{Error, Result},
    middleware::auth::Claims,
    routes,
    services::{
        ai_flows::{FLOW_JOB_DESCRIPTION, FLOW_PROFILE, FLOW_RESUME_TEXT, FLOW_SUMMARY, FLOW_VIDEO},
        ai_provider::{AiProvider, FlowRequest},
    },
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret";
pub const EMBEDDING: [f32; 2] = [0.6, 0.8];

/// Canned answers per flow; selected flows can be made to fail or stall.
#[derive(Default)]
pub struct ScriptedProvider {
    pub failing_flows: Vec<&'static str>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn failing(flows: &[&'static str]) -> Self {
        Self {
            failing_flows: flows.to_vec(),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn complete_json(&self, request: FlowRequest) -> Result<JsonValue> {
        self.calls.lock().unwrap().push(request.flow.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_flows.contains(&request.flow) {
            return Err(Error::Ai(format!("{} unavailable", request.flow)));
        }
        let output = match request.flow {
            FLOW_RESUME_TEXT => json!({
                "text": "Aziza Karimova\nBackend engineer, 6 years of Rust and PostgreSQL.\nTashkent"
            }),
            FLOW_PROFILE => json!({
                "title": "Backend Engineer",
                "experience": "senior",
                "location": "Tashkent",
                "skills": ["Rust", "PostgreSQL"],
                "links": { "github": "https://github.com/aziza" }
            }),
            FLOW_SUMMARY => json!({
                "summary": "Backend engineer with six years of Rust.",
                "highlights": ["Rust", "PostgreSQL"]
            }),
            FLOW_VIDEO => json!({
                "summary": "Confident and structured introduction.",
                "communicationScore": 81,
                "highlights": ["clear"]
            }),
            FLOW_JOB_DESCRIPTION => json!({
                "description": "Join our platform team.",
                "responsibilities": ["Own services"],
                "requirements": ["Rust"]
            }),
            other => return Err(Error::Ai(format!("unscripted flow {}", other))),
        };
        Ok(output)
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push("embed".to_string());
        if self.failing_flows.contains(&"embed") {
            return Err(Error::Ai("embeddings unavailable".into()));
        }
        Ok(texts.iter().map(|_| EMBEDDING.to_vec()).collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<ScriptedProvider>,
    _storage: TempDir,
}

pub fn test_config(storage: &TempDir) -> Config {
    Config::for_tests(JWT_SECRET, storage.path().to_str().unwrap())
}

pub fn spawn_app(provider: ScriptedProvider) -> TestApp {
    spawn_app_with(provider, |_| {})
}

pub fn spawn_app_with(provider: ScriptedProvider, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let storage = tempfile::tempdir().unwrap();
    let mut config = test_config(&storage);
    tweak(&mut config);
    let provider = Arc::new(provider);
    let state = AppState::new(config, Arc::new(MemoryDocumentStore::new()), provider.clone());
    TestApp {
        router: routes::router(state.clone()),
        state,
        provider,
        _storage: storage,
    }
}

pub fn token(uid: &str, role: &str, company: Option<&str>) -> String {
    let claims = Claims {
        sub: uid.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
        company_id: company.map(str::to_string),
        email: Some(format!("{}@example.com", uid)),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: JsonValue,
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: JsonValue) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: JsonValue) -> TestResponse {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    /// Polls a processing job until it leaves the queue.
    pub async fn wait_for_job(&self, id: &str, token: &str) -> JsonValue {
        for _ in 0..300 {
            let res = self.get(&format!("/api/processing/jobs/{}", id), Some(token)).await;
            assert_eq!(res.status, StatusCode::OK);
            let status = res.body["status"].as_str().unwrap_or_default().to_string();
            if status == "completed" || status == "failed" {
                return res.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("processing job {} did not finish", id);
    }
}

pub fn pdf_base64() -> String {
    STANDARD.encode(b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n")
}

pub fn mp4_base64() -> String {
    STANDARD.encode(b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom")
}
