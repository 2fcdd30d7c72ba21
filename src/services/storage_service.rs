use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    IntroVideo,
    InterviewVideo,
    ProfilePicture,
}

impl UploadKind {
    fn allowed(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            UploadKind::Resume => &[
                ("application/pdf", "pdf"),
                ("application/msword", "doc"),
                (
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "docx",
                ),
                ("application/rtf", "rtf"),
                ("text/plain", "txt"),
            ],
            UploadKind::IntroVideo | UploadKind::InterviewVideo => &[
                ("video/mp4", "mp4"),
                ("video/webm", "webm"),
                ("video/quicktime", "mov"),
            ],
            UploadKind::ProfilePicture => &[
                ("image/jpeg", "jpg"),
                ("image/png", "png"),
                ("image/webp", "webp"),
            ],
        }
    }

    /// Bucket path following the `candidates/{uid}/resume/...`, `videos/{intro|interview}/{uid}/...`,
    /// `profile-pictures/{uid}/...` conventions.
    pub fn object_path(&self, uid: &str, file_name: &str) -> String {
        match self {
            UploadKind::Resume => format!("candidates/{}/resume/{}", uid, file_name),
            UploadKind::IntroVideo => format!("videos/intro/{}/{}", uid, file_name),
            UploadKind::InterviewVideo => format!("videos/interview/{}/{}", uid, file_name),
            UploadKind::ProfilePicture => format!("profile-pictures/{}/{}", uid, file_name),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            UploadKind::Resume => "resume",
            UploadKind::IntroVideo => "video",
            UploadKind::InterviewVideo => "interview recording",
            UploadKind::ProfilePicture => "profile picture",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub mime_type: String,
    pub size: usize,
    pub sha256: String,
}

/// Local-filesystem bucket. Access rules live with the bucket, not here.
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
    max_bytes: usize,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub async fn store(
        &self,
        kind: UploadKind,
        uid: &str,
        mime_type: &str,
        data: &Bytes,
    ) -> Result<StoredObject> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        let ext = kind
            .allowed()
            .iter()
            .find(|(mime, _)| *mime == mime_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                Error::BadRequest(format!(
                    "File type {} is not allowed for {}",
                    mime_type,
                    kind.label()
                ))
            })?;

        if data.is_empty() {
            return Err(Error::BadRequest(format!("Empty {} upload", kind.label())));
        }
        if data.len() > self.max_bytes {
            return Err(Error::BadRequest(format!(
                "{} exceeds the {} byte limit",
                kind.label(),
                self.max_bytes
            )));
        }
        check_signature(ext, data)?;
        check_segment(uid)?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = kind.object_path(uid, &file_name);
        let full_path = self.root.join(&path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, data).await.map_err(|e| {
            tracing::error!(error = %e, path = %path, "failed to write upload");
            Error::Storage(format!("Failed to save file: {}", e))
        })?;

        let sha256 = hex::encode(Sha256::digest(data));
        tracing::info!(path = %path, size = data.len(), "stored upload");
        Ok(StoredObject {
            path,
            mime_type,
            size: data.len(),
            sha256,
        })
    }

    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || path.is_empty() {
            return Err(Error::BadRequest(format!("Invalid object path: {}", path)));
        }
        match fs::read(self.root.join(relative)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Object {} not found", path)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn check_segment(uid: &str) -> Result<()> {
    let valid = !uid.is_empty()
        && uid.len() <= 128
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::BadRequest(format!("Invalid user id: {}", uid)))
    }
}

fn check_signature(ext: &str, data: &[u8]) -> Result<()> {
    let ok = match ext {
        "pdf" => data.starts_with(b"%PDF"),
        "docx" => data.starts_with(b"PK\x03\x04"),
        "doc" => data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
        "rtf" => data.starts_with(b"{\\rtf"),
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "jpg" => data.starts_with(&[0xFF, 0xD8]),
        "webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
        "webm" => data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        "mp4" | "mov" => data.len() >= 8 && &data[4..8] == b"ftyp",
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::BadRequest(format!("Invalid {} file content", ext.to_uppercase())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> StorageService {
        StorageService::new(dir.path(), 1024)
    }

    #[tokio::test]
    async fn stores_resume_under_candidate_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let svc = storage(&dir);
        let data = Bytes::from_static(b"%PDF-1.7 body");
        let stored = svc
            .store(UploadKind::Resume, "user_1", "application/pdf", &data)
            .await
            .unwrap();
        assert!(stored.path.starts_with("candidates/user_1/resume/"));
        assert!(stored.path.ends_with(".pdf"));
        assert_eq!(stored.sha256.len(), 64);
        assert_eq!(svc.read(&stored.path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn rejects_spoofed_pdf_and_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let svc = storage(&dir);
        let bogus = Bytes::from_static(b"MZ not a pdf");
        assert!(svc
            .store(UploadKind::Resume, "u1", "application/pdf", &bogus)
            .await
            .is_err());
        assert!(svc
            .store(UploadKind::Resume, "u1", "application/x-msdownload", &bogus)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_uploads_and_path_tricks() {
        let dir = tempfile::tempdir().unwrap();
        let svc = storage(&dir);
        let big = Bytes::from(vec![b'a'; 2048]);
        assert!(svc.store(UploadKind::Resume, "u1", "text/plain", &big).await.is_err());

        let small = Bytes::from_static(b"hello");
        assert!(svc.store(UploadKind::Resume, "../etc", "text/plain", &small).await.is_err());
        assert!(svc.read("../secret").await.is_err());
    }

    #[test]
    fn video_paths_follow_bucket_convention() {
        assert_eq!(
            UploadKind::IntroVideo.object_path("u1", "a.mp4"),
            "videos/intro/u1/a.mp4"
        );
        assert_eq!(
            UploadKind::InterviewVideo.object_path("u1", "b.webm"),
            "videos/interview/u1/b.webm"
        );
        assert_eq!(
            UploadKind::ProfilePicture.object_path("u1", "p.png"),
            "profile-pictures/u1/p.png"
        );
    }
}
