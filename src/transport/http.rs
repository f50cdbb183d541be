//! HTTP delta source
//!
//! Polls `GET {base_url}/rest/display/{since_millis}` and decodes the body as
//! an [`ApplicationDelta`].

use super::source::{DeltaSource, TransportError};
use crate::delta::ApplicationDelta;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub struct HttpDeltaSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeltaSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the delta endpoint for a given watermark
    pub fn display_url(&self, since: DateTime<Utc>) -> String {
        format!("{}/rest/display/{}", self.base_url, since.timestamp_millis())
    }
}

#[async_trait]
impl DeltaSource for HttpDeltaSource {
    async fn fetch(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Option<ApplicationDelta>, TransportError> {
        let url = self.display_url(since);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(ApplicationDelta::from_json(&body)?)
    }

    fn source_type(&self) -> &'static str {
        "http"
    }
}
