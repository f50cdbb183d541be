//! Local file delta source for debugging
//!
//! The file holds a whole snapshot rather than a delta, so it is only handed to
//! the engine when its contents change. An unchanged file reads as "no update".
//! Otherwise hits already aged out of the tree would be merged again on every
//! tick and evicted again straight away.

use super::source::{DeltaSource, TransportError};
use crate::delta::ApplicationDelta;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub struct FileDeltaSource {
    path: PathBuf,
    /// Contents of the last successfully decoded read
    last_body: Option<String>,
}

impl FileDeltaSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_body: None,
        }
    }
}

#[async_trait]
impl DeltaSource for FileDeltaSource {
    async fn fetch(
        &mut self,
        _since: DateTime<Utc>,
    ) -> Result<Option<ApplicationDelta>, TransportError> {
        let body = match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Delta file not found: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if body.trim().is_empty() {
            return Ok(None);
        }

        if self.last_body.as_deref() == Some(body.as_str()) {
            log::debug!("Delta file unchanged: {}", self.path.display());
            return Ok(None);
        }

        let delta = ApplicationDelta::from_json(&body)?;
        self.last_body = Some(body);
        Ok(delta)
    }

    fn source_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_delta_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("delta.json");
        tokio::fs::write(
            &path,
            r#"{"name":"app1","children":[{"uuid":"g1","children":[{"id":"h1","timestamp":1700000000000,"count":2}]}]}"#,
        )
        .await
        .unwrap();

        let mut source = FileDeltaSource::new(path);
        let delta = source.fetch(Utc::now()).await.unwrap().unwrap();

        assert_eq!(delta.name.as_deref(), Some("app1"));
        assert_eq!(delta.hit_count(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_file_is_not_resent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("delta.json");
        let body = r#"{"name":"app1","children":[{"uuid":"g1","children":[{"id":"h1","timestamp":1700000000000}]}]}"#;
        tokio::fs::write(&path, body).await.unwrap();

        let mut source = FileDeltaSource::new(path.clone());
        assert!(source.fetch(Utc::now()).await.unwrap().is_some());
        assert!(source.fetch(Utc::now()).await.unwrap().is_none());

        tokio::fs::write(&path, body.replace("h1", "h2")).await.unwrap();
        let delta = source.fetch(Utc::now()).await.unwrap().unwrap();
        assert_eq!(delta.children[0].children[0].id.as_deref(), Some("h2"));
    }

    #[tokio::test]
    async fn test_decode_error_is_retried() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("delta.json");
        tokio::fs::write(&path, "{\"name\": ").await.unwrap();

        let mut source = FileDeltaSource::new(path);
        assert!(source.fetch(Utc::now()).await.is_err());
        assert!(source.fetch(Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut source = FileDeltaSource::new(temp_dir.path().join("absent.json"));

        assert!(source.fetch(Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_file_is_decode_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("delta.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let mut source = FileDeltaSource::new(path);
        let result = source.fetch(Utc::now()).await;

        assert!(matches!(result, Err(TransportError::Decode(_))));
    }
}
