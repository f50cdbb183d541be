//! Hit Tree - incremental aggregation and eviction engine
//!
//! Keeps the application → gear → hit hierarchy in memory, merges delta
//! updates into it, ages hits out of a retention window and emits a flattened
//! node list for the renderer.
//!
//! - `model` - tree node types and the flattened `FlatNode`
//! - `index` - uuid/id lookup gating every membership change
//! - `engine` - `HitTree`: merge, evict, recalculate, flatten

pub mod engine;
pub mod index;
pub mod model;

pub use engine::{CycleOutcome, CycleStats, HitTree};
pub use index::{EntryKind, TreeIndex};
pub use model::{Application, FlatNode, Gear, Hit};
