//! hitscope - live view of traffic hitting a horizontally scaled application
//!
//! ```text
//! DeltaSource (http | file | simulate)
//!     ↓ fetch(since)
//! Poller ── HitTree (merge → evict → recalculate → flatten)
//!     ↓ CycleOutcome { redraw, nodes }
//! HitView (Arc<RwLock>)
//!     ↓
//! TUI / headless log
//! ```

pub mod config;
pub mod delta;
pub mod poller;
pub mod transport;
pub mod tree;
pub mod ui;
pub mod view;

pub use config::{Config, ConfigError, SourceType};
pub use delta::{ApplicationDelta, GearDelta, HitDelta};
pub use poller::Poller;
pub use tree::{CycleOutcome, FlatNode, HitTree};
pub use view::HitView;
