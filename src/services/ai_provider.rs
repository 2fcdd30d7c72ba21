use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum ContentPart {
    Text(String),
    Media { mime_type: String, data: Bytes },
}

/// One call to the generative provider: a fixed system prompt plus ordered user parts.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    pub flow: &'static str,
    pub system_prompt: String,
    pub parts: Vec<ContentPart>,
    pub temperature: f32,
}

impl FlowRequest {
    pub fn new(flow: &'static str, system_prompt: impl Into<String>) -> Self {
        Self {
            flow,
            system_prompt: system_prompt.into(),
            parts: Vec::new(),
            temperature: 0.2,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(ContentPart::Text(text.into()));
        self
    }

    pub fn media(mut self, mime_type: impl Into<String>, data: Bytes) -> Self {
        self.parts.push(ContentPart::Media {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// JSON-mode completion; returns the parsed JSON object the model produced.
    async fn complete_json(&self, request: FlowRequest) -> Result<JsonValue>;

    /// One embedding per input text, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// OpenAI-compatible chat-completions / embeddings backend.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiProvider {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.ai_base_url)
            .map_err(|e| Error::Config(format!("Invalid AI_BASE_URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key: config.ai_api_key.clone(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            chat_model: config.ai_chat_model.clone(),
            embedding_model: config.ai_embedding_model.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn user_content(parts: &[ContentPart]) -> Vec<JsonValue> {
        parts
            .iter()
            .enumerate()
            .map(|(idx, part)| match part {
                ContentPart::Text(text) => json!({ "type": "text", "text": text }),
                ContentPart::Media { mime_type, data } => {
                    let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(data));
                    if mime_type.starts_with("image/") {
                        json!({
                            "type": "image_url",
                            "image_url": { "url": data_url, "detail": "high" }
                        })
                    } else {
                        json!({
                            "type": "file",
                            "file": {
                                "filename": format!("upload-{}.{}", idx, extension_for(mime_type)),
                                "file_data": data_url
                            }
                        })
                    }
                }
            })
            .collect()
    }
}

fn extension_for(mime_type: &str) -> &str {
    mime_type
        .rsplit('/')
        .next()
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin")
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete_json(&self, request: FlowRequest) -> Result<JsonValue> {
        let payload = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": Self::user_content(&request.parts) }
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature
        });

        let res = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Ai(format!("{} request failed: {}", request.flow, e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Ai(format!(
                "{} provider error {}: {}",
                request.flow, status, text
            )));
        }

        let body: JsonValue = res
            .json()
            .await
            .map_err(|e| Error::Ai(format!("{} response unreadable: {}", request.flow, e)))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::Ai(format!("{} returned an invalid response format", request.flow)))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        #[derive(serde::Serialize)]
        struct EmbReq<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(serde::Deserialize)]
        struct EmbData {
            #[serde(default)]
            index: usize,
            embedding: Vec<f32>,
        }
        #[derive(serde::Deserialize)]
        struct EmbResp {
            data: Vec<EmbData>,
        }

        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbReq {
            model: &self.embedding_model,
            input: &texts,
        };
        let resp = self
            .client
            .post(self.endpoint("embeddings"))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Ai(format!("embeddings request failed: {}", e)))?;

        let status = resp.status();
        let txt = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Ai(format!("embeddings status {}: {}", status.as_u16(), txt)));
        }
        let mut parsed: EmbResp = serde_json::from_str(&txt)
            .map_err(|e| Error::Ai(format!("embeddings parse failed: {}", e)))?;
        parsed.data.sort_by_key(|d| d.index);
        if parsed.data.len() != texts.len() {
            return Err(Error::Ai(format!(
                "embeddings returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
