//! Delta payloads delivered by a [`crate::transport::DeltaSource`]
//!
//! Identity fields are optional on the wire so a single malformed gear or hit
//! can be skipped by the merge instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<GearDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearDelta {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub children: Vec<HitDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitDelta {
    #[serde(default)]
    pub id: Option<String>,
    /// Event time in epoch milliseconds
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default = "default_count")]
    pub count: u64,
}

fn default_count() -> u64 {
    1
}

impl ApplicationDelta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            children: Vec::new(),
        }
    }

    pub fn with_gear(mut self, gear: GearDelta) -> Self {
        self.children.push(gear);
        self
    }

    /// Parse a delta body. `null` and `{}` both mean "nothing new".
    pub fn from_json(body: &str) -> Result<Option<Self>, serde_json::Error> {
        let delta: Option<ApplicationDelta> = serde_json::from_str(body)?;
        Ok(delta.filter(|d| !d.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.children.is_empty()
    }

    /// Total number of hits carried by this delta (including malformed ones)
    pub fn hit_count(&self) -> usize {
        self.children.iter().map(|g| g.children.len()).sum()
    }
}

impl GearDelta {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            children: Vec::new(),
        }
    }

    pub fn with_hit(mut self, hit: HitDelta) -> Self {
        self.children.push(hit);
        self
    }
}

impl HitDelta {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, count: u64) -> Self {
        Self {
            id: Some(id.into()),
            timestamp: Some(timestamp),
            count,
        }
    }
}
