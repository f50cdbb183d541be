//! Delta source trait
//!
//! Defines the interface the poll loop uses to fetch deltas, independent of
//! where they come from (HTTP endpoint, local file, simulator).

use crate::delta::ApplicationDelta;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub enum TransportError {
    Http(reqwest::Error),
    Status(u16),
    Io(std::io::Error),
    Decode(serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Http(e) => write!(f, "HTTP error: {}", e),
            TransportError::Status(code) => write!(f, "Unexpected HTTP status: {}", code),
            TransportError::Io(e) => write!(f, "IO error: {}", e),
            TransportError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

/// Source of delta payloads
#[async_trait]
pub trait DeltaSource: Send {
    /// Fetch everything new since `since`. `Ok(None)` means nothing new.
    async fn fetch(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Option<ApplicationDelta>, TransportError>;

    /// Get source type for logging
    fn source_type(&self) -> &'static str;
}
