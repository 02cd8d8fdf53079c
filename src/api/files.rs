//! Files API
//!
//! Uploaded file metadata, plus the in-memory file part shared by every
//! multipart endpoint.

use crate::api::common::{timestamp, Object};
use crate::error::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file uploaded to the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    /// File ID
    pub id: String,

    /// `file`
    #[serde(default)]
    pub object: Object,

    /// Size in bytes
    pub bytes: u64,

    /// Upload time, unix seconds
    pub created_at: u64,

    /// Name given at upload
    pub filename: String,

    /// Owning organization, when reported
    #[serde(default)]
    pub owner: Option<String>,

    /// Intended use, e.g. `fine-tune`
    pub purpose: String,
}

impl File {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created_at)
    }
}

/// File content for a multipart form field
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name sent with the part
    pub name: String,

    /// Raw file bytes
    pub content: Bytes,

    /// MIME type; reqwest leaves the part untyped when unset
    pub mime: Option<String>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, named after its last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Self::new(name, content))
    }
}

/// Upload a JSON Lines document for later use, usually fine-tuning
#[derive(Debug, Clone)]
pub struct FileRequest {
    /// Document to upload
    pub file: FileUpload,

    /// e.g. `fine-tune`
    pub purpose: String,
}

impl FileRequest {
    pub fn new(file: FileUpload, purpose: impl Into<String>) -> Self {
        Self {
            file,
            purpose: purpose.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_deserialization() {
        let file: File = serde_json::from_str(
            r#"{
                "id": "file-XjGxS3KTG0uNmNOK362iJua3",
                "object": "file",
                "bytes": 140,
                "created_at": 1613779121,
                "filename": "mydata.jsonl",
                "purpose": "fine-tune"
            }"#,
        )
        .unwrap();

        assert_eq!(file.object, Object::File);
        assert_eq!(file.bytes, 140);
        assert!(file.owner.is_none());
        assert_eq!(
            file.created().unwrap().to_rfc3339(),
            "2021-02-19T23:58:41+00:00"
        );
    }

    #[tokio::test]
    async fn test_upload_from_path() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"{\"prompt\":\"a\",\"completion\":\"b\"}\n").unwrap();

        let upload = FileUpload::from_path(tmp.path()).await.unwrap();
        assert_eq!(
            upload.name,
            tmp.path().file_name().unwrap().to_string_lossy()
        );
        assert!(upload.content.starts_with(b"{\"prompt\""));
        assert!(upload.mime.is_none());
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let err = FileUpload::from_path("/definitely/not/here.jsonl").await.unwrap_err();
        assert!(matches!(err, crate::error::OaiError::Io(_)));
    }
}
