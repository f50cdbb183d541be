//! Tree node types for the application → gear → hit hierarchy
//!
//! Ownership flows strictly parent → child. There are no back pointers:
//! the owning gear of a hit is answered by [`super::index::TreeIndex`].

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Root of the tree. At most one exists per [`super::HitTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub name: String,
    /// Gears in arrival order
    pub children: Vec<Gear>,
    pub size: u64,
}

impl Application {
    pub fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            size: 0,
        }
    }
}

/// One compute unit of the scaled application
#[derive(Debug, Clone, PartialEq)]
pub struct Gear {
    pub uuid: String,
    /// Hits in arrival order (append-only until eviction)
    pub children: Vec<Hit>,
    pub size: u64,
}

impl Gear {
    pub fn new(uuid: String) -> Self {
        Self {
            uuid,
            children: Vec::new(),
            size: 0,
        }
    }
}

/// A bucket of one or more requests served by a gear
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Raw number of requests folded into this hit
    pub count: u64,
    pub size: u64,
}

impl Hit {
    pub fn new(id: String, timestamp: DateTime<Utc>, count: u64) -> Self {
        Self {
            id,
            timestamp,
            count,
            size: 0,
        }
    }

    /// Age of the hit relative to `now`. Negative for timestamps in the future.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}

/// Render-ready node emitted by [`super::HitTree::flatten`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlatNode {
    Application {
        name: String,
        size: u64,
    },
    Gear {
        uuid: String,
        size: u64,
        hit_count: usize,
    },
    Hit {
        id: String,
        gear: String,
        timestamp: DateTime<Utc>,
        count: u64,
        size: u64,
    },
}

impl FlatNode {
    /// Stable identity used by the renderer for keyed diffing
    pub fn key(&self) -> &str {
        match self {
            FlatNode::Application { name, .. } => name,
            FlatNode::Gear { uuid, .. } => uuid,
            FlatNode::Hit { id, .. } => id,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            FlatNode::Application { size, .. }
            | FlatNode::Gear { size, .. }
            | FlatNode::Hit { size, .. } => *size,
        }
    }

    /// Depth in the tree: application 0, gear 1, hit 2
    pub fn depth(&self) -> usize {
        match self {
            FlatNode::Application { .. } => 0,
            FlatNode::Gear { .. } => 1,
            FlatNode::Hit { .. } => 2,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FlatNode::Application { .. } => "application",
            FlatNode::Gear { .. } => "gear",
            FlatNode::Hit { .. } => "hit",
        }
    }

    /// Whether this node can own children (and therefore be collapsed)
    pub fn is_branch(&self) -> bool {
        !matches!(self, FlatNode::Hit { .. })
    }
}
