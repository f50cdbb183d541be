use {
    crate::tree::{CycleOutcome, FlatNode},
    chrono::{DateTime, Utc},
};

/// Latest render-ready snapshot shared between the poll loop and the renderer
///
/// The poll loop is the only writer. `nodes` is replaced only when a cycle
/// signals a redraw, and each replacement bumps `generation` so renderers can
/// skip work when nothing changed.
#[derive(Debug)]
pub struct HitView {
    nodes: Vec<FlatNode>,
    generation: u64,
    cycles: u64,
    last_poll: Option<DateTime<Utc>>,
    last_error: Option<String>,
    source: &'static str,
    retention: chrono::Duration,
}

impl HitView {
    pub fn new(source: &'static str, retention: chrono::Duration) -> Self {
        Self {
            nodes: Vec::new(),
            generation: 0,
            cycles: 0,
            last_poll: None,
            last_error: None,
            source,
            retention,
        }
    }

    /// Record a completed cycle. Returns true if the nodes were replaced.
    pub fn apply(&mut self, outcome: CycleOutcome, now: DateTime<Utc>) -> bool {
        self.cycles += 1;
        self.last_poll = Some(now);
        self.last_error = None;

        if outcome.redraw {
            self.nodes = outcome.nodes;
            self.generation += 1;
        }

        outcome.redraw
    }

    /// Record a failed poll; the last good snapshot stays visible
    pub fn record_error(&mut self, error: String) {
        self.last_error = Some(error);
    }

    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.last_poll
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn retention(&self) -> chrono::Duration {
        self.retention
    }

    pub fn gear_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, FlatNode::Gear { .. }))
            .count()
    }

    pub fn hit_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, FlatNode::Hit { .. }))
            .count()
    }

    /// Total request count (the application's size)
    pub fn total_size(&self) -> u64 {
        match self.nodes.first() {
            Some(FlatNode::Application { size, .. }) => *size,
            _ => 0,
        }
    }
}
