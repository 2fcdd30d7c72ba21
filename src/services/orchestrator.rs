//! Sequences AI flows for one candidate and folds their outputs into a single
//! profile update. Nothing here persists: callers decide what to write.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::candidate::{
    CandidateProfile, ExperienceLevel, ProfileLinks, SalaryExpectation, VideoAnalysis,
};
use crate::models::job::Job;
use crate::services::ai_flows::{AiFlows, ExtractedProfile, ResumeSummary};

#[derive(Debug, Clone)]
pub struct Upload {
    pub data: Bytes,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentInputs {
    pub resume: Option<Upload>,
    pub video: Option<Upload>,
}

/// Merge patch for a candidate document. Absent fields are not written.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEnrichment {
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
    pub resume_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_highlights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_analysis: Option<VideoAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_processed_at: Option<DateTime<Utc>>,
}

impl ProfileEnrichment {
    fn with_extracted(mut self, hints: &CandidateProfile, extracted: ExtractedProfile) -> Self {
        // Details the candidate typed in win over what the model inferred.
        self.title = pick(&hints.title, extracted.title);
        self.experience = hints.experience.or(extracted.experience);
        self.location = pick(&hints.location, extracted.location);
        self.phone = pick(&hints.phone, extracted.phone);
        self.salary_expectation = hints
            .salary_expectation
            .clone()
            .or(extracted.salary_expectation);

        let mut skills = hints.skills.clone();
        for skill in extracted.skills {
            if !skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
                skills.push(skill);
            }
        }
        if !skills.is_empty() {
            self.skills = Some(skills);
        }

        let links = ProfileLinks {
            linkedin: hints.links.linkedin.clone().or(extracted.links.linkedin),
            github: hints.links.github.clone().or(extracted.links.github),
            portfolio: hints.links.portfolio.clone().or(extracted.links.portfolio),
            website: hints.links.website.clone().or(extracted.links.website),
        };
        if !links.is_empty() {
            self.links = Some(links);
        }
        self
    }

    fn with_summary(mut self, summary: ResumeSummary) -> Self {
        self.resume_summary = Some(summary.summary);
        self.resume_highlights = Some(summary.highlights);
        self
    }

    fn stamped(mut self) -> Self {
        self.ai_processed_at = Some(Utc::now());
        self
    }
}

fn pick(hint: &Option<String>, extracted: Option<String>) -> Option<String> {
    hint.clone().or(extracted)
}

#[derive(Clone)]
pub struct AiOrchestrator {
    flows: AiFlows,
}

impl AiOrchestrator {
    pub fn new(flows: AiFlows) -> Self {
        Self { flows }
    }

    pub fn flows(&self) -> &AiFlows {
        &self.flows
    }

    /// Full synchronous pipeline: resume text, profile, summary, embedding, then video.
    /// Any failing step fails the whole call.
    pub async fn enrich_candidate(
        &self,
        candidate_id: &str,
        hints: &CandidateProfile,
        inputs: EnrichmentInputs,
    ) -> Result<ProfileEnrichment> {
        tracing::info!(
            candidate_id,
            has_resume = inputs.resume.is_some(),
            has_video = inputs.video.is_some(),
            "starting candidate enrichment"
        );

        let resume_text = match inputs.resume {
            Some(upload) => Some(
                self.flows
                    .extract_resume_text(upload.data, &upload.mime_type)
                    .await?,
            ),
            None => None,
        };

        let mut enrichment = self
            .profile_from_text(hints, resume_text.as_deref())
            .await?;
        enrichment.resume_text = resume_text;

        if let Some(video) = inputs.video {
            let analysis = self
                .flows
                .analyze_video_intro(video.data, &video.mime_type)
                .await?;
            enrichment.video_analysis = Some(analysis);
        }

        tracing::info!(candidate_id, "candidate enrichment finished");
        Ok(enrichment.stamped())
    }

    /// Resume job step: text extraction and summary only.
    pub async fn process_resume(&self, candidate_id: &str, upload: Upload) -> Result<ProfileEnrichment> {
        let text = self
            .flows
            .extract_resume_text(upload.data, &upload.mime_type)
            .await?;
        let summary = self.flows.summarize_resume(&text).await?;
        tracing::info!(candidate_id, chars = text.len(), "resume processed");

        let mut enrichment = ProfileEnrichment::default().with_summary(summary);
        enrichment.resume_text = Some(text);
        Ok(enrichment.stamped())
    }

    /// Video job step.
    pub async fn process_video(&self, candidate_id: &str, upload: Upload) -> Result<ProfileEnrichment> {
        let analysis = self
            .flows
            .analyze_video_intro(upload.data, &upload.mime_type)
            .await?;
        tracing::info!(
            candidate_id,
            communication_score = analysis.communication_score,
            "video introduction processed"
        );
        Ok(ProfileEnrichment {
            video_analysis: Some(analysis),
            ..Default::default()
        }
        .stamped())
    }

    /// Profile job step: works from whatever resume text is already stored, or the typed details.
    pub async fn generate_profile(&self, profile: &CandidateProfile) -> Result<ProfileEnrichment> {
        let enrichment = self
            .profile_from_text(profile, profile.resume_text.as_deref())
            .await?;
        tracing::info!(candidate_id = %profile.id, "profile generated");
        Ok(enrichment.stamped())
    }

    /// The posting's stored embedding, or a freshly computed one when none is stored.
    pub async fn job_embedding(&self, job: &Job) -> Result<Vec<f32>> {
        if job.embedding.is_empty() {
            self.flows.embed_text(&job.matching_text()).await
        } else {
            Ok(job.embedding.clone())
        }
    }

    async fn profile_from_text(
        &self,
        hints: &CandidateProfile,
        resume_text: Option<&str>,
    ) -> Result<ProfileEnrichment> {
        let hint_text = hints.hint_text();
        let source = match resume_text {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ if !hint_text.is_empty() => hint_text,
            _ => {
                return Err(Error::BadRequest(
                    "no resume or profile details to process".to_string(),
                ))
            }
        };

        let extracted = self.flows.extract_profile(&source, hints).await?;
        let summary = self.flows.summarize_resume(&source).await?;
        let embedding_input = embedding_text(&summary, &extracted, hints);
        let embedding = self.flows.embed_text(&embedding_input).await?;

        let mut enrichment = ProfileEnrichment::default()
            .with_extracted(hints, extracted)
            .with_summary(summary);
        enrichment.embedding = Some(embedding);
        Ok(enrichment)
    }
}

fn embedding_text(summary: &ResumeSummary, extracted: &ExtractedProfile, hints: &CandidateProfile) -> String {
    let title = hints
        .title
        .as_deref()
        .or(extracted.title.as_deref())
        .unwrap_or_default();
    let mut skills = hints.skills.clone();
    skills.extend(extracted.skills.iter().cloned());
    format!("{}\n{}\nSkills: {}", title, summary.summary, skills.join(", "))
}

pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

pub fn similarity_score(a: &[f32], b: &[f32]) -> u8 {
    (cosine_sim(a, b).clamp(0.0, 1.0) * 100.0).round() as u8
}
