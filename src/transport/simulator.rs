//! Synthetic traffic source
//!
//! Models the hit tracker running on every gear: requests are counted in
//! memory and flushed as one hit (a bucket carrying a `count`) once the
//! bucket window has elapsed. The gear count ramps up over time the way a
//! load ramp scales the application out.

use super::source::{DeltaSource, TransportError};
use crate::delta::{ApplicationDelta, GearDelta, HitDelta};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub app_name: String,
    pub max_gears: usize,
    /// How long a gear buffers requests before flushing a hit
    pub bucket_window: Duration,
    /// Time between scale-out steps
    pub ramp_interval: Duration,
    /// Upper bound of requests a gear receives per tick
    pub max_requests_per_tick: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            app_name: "scaledemo".to_string(),
            max_gears: 4,
            bucket_window: Duration::seconds(1),
            ramp_interval: Duration::seconds(30),
            max_requests_per_tick: 20,
        }
    }
}

/// Per-gear request counter
#[derive(Debug)]
struct GearCounter {
    uuid: String,
    pending: u64,
    bucket_start: DateTime<Utc>,
    sequence: u64,
}

impl GearCounter {
    fn new(uuid: String, now: DateTime<Utc>) -> Self {
        Self {
            uuid,
            pending: 0,
            bucket_start: now,
            sequence: 0,
        }
    }

    fn record(&mut self, requests: u64) {
        self.pending += requests;
    }

    /// Emit a hit if the bucket window elapsed and requests are pending
    fn flush_due(&mut self, now: DateTime<Utc>, window: Duration) -> Option<HitDelta> {
        if self.pending == 0 || now - self.bucket_start <= window {
            return None;
        }

        self.sequence += 1;
        let hit = HitDelta::new(format!("{}-{}", self.uuid, self.sequence), now, self.pending);

        self.pending = 0;
        self.bucket_start = now;
        Some(hit)
    }
}

pub struct SimulatedDeltaSource {
    config: SimulatorConfig,
    gears: Vec<GearCounter>,
    started: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl SimulatedDeltaSource {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic simulator for tests
    pub fn with_seed(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> Self {
        Self {
            config,
            gears: Vec::new(),
            started: None,
            rng,
        }
    }

    /// Number of gears the application has scaled out to so far
    pub fn gear_count(&self) -> usize {
        self.gears.len()
    }

    /// Advance the simulation to `now` and collect flushed hits
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ApplicationDelta> {
        let started = *self.started.get_or_insert(now);

        let ramp_secs = self.config.ramp_interval.num_seconds().max(1);
        let steps = ((now - started).num_seconds().max(0) / ramp_secs) as usize;
        let target = (1 + steps).min(self.config.max_gears);

        while self.gears.len() < target {
            let uuid = format!("{:032x}", self.rng.gen::<u128>());
            log::info!("Simulated scale-out: gear {} ({} of {})", uuid, self.gears.len() + 1, self.config.max_gears);
            self.gears.push(GearCounter::new(uuid, now));
        }

        let mut delta = ApplicationDelta::new(self.config.app_name.clone());
        for gear in self.gears.iter_mut() {
            let requests = self.rng.gen_range(1..=self.config.max_requests_per_tick.max(1));
            gear.record(requests);

            if let Some(hit) = gear.flush_due(now, self.config.bucket_window) {
                delta = delta.with_gear(GearDelta::new(gear.uuid.clone()).with_hit(hit));
            }
        }

        if delta.children.is_empty() {
            None
        } else {
            Some(delta)
        }
    }
}

#[async_trait]
impl DeltaSource for SimulatedDeltaSource {
    async fn fetch(
        &mut self,
        _since: DateTime<Utc>,
    ) -> Result<Option<ApplicationDelta>, TransportError> {
        Ok(self.tick(Utc::now()))
    }

    fn source_type(&self) -> &'static str {
        "simulate"
    }
}
