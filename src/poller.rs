//! Poll loop - drives one tree cycle per tick
//!
//! ```text
//! interval tick
//!     ↓
//! DeltaSource::fetch(since)
//!     ↓ Ok(Some)            ↓ Ok(None)          ↓ Err
//! HitTree::poll_cycle()   HitTree::expire()   log + backoff (tree untouched)
//!     ↓
//! HitView::apply()  (nodes replaced only on redraw)
//! ```

use crate::transport::{DeltaSource, PollBackoff, TransportError};
use crate::tree::HitTree;
use crate::view::HitView;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration, MissedTickBehavior};

pub struct Poller {
    source: Box<dyn DeltaSource>,
    tree: HitTree,
    retention: chrono::Duration,
    /// Time taken before the last successful fetch; deltas are requested from here
    since: DateTime<Utc>,
    backoff: PollBackoff,
    view: Arc<RwLock<HitView>>,
}

impl Poller {
    pub fn new(
        source: Box<dyn DeltaSource>,
        retention: chrono::Duration,
        view: Arc<RwLock<HitView>>,
    ) -> Self {
        Self {
            source,
            tree: HitTree::new(),
            retention,
            since: DateTime::<Utc>::UNIX_EPOCH,
            backoff: PollBackoff::default(),
            view,
        }
    }

    /// Fetch once and run a cycle. Returns whether a redraw is needed.
    ///
    /// On a transport error the tree is not touched and `since` is kept, so
    /// the next poll asks for the same range again.
    pub async fn poll_once(&mut self) -> Result<bool, TransportError> {
        let requested_at = Utc::now();

        let delta = match self.source.fetch(self.since).await {
            Ok(delta) => delta,
            Err(e) => {
                self.view.write().await.record_error(e.to_string());
                return Err(e);
            }
        };
        self.since = requested_at;

        let now = Utc::now();
        let outcome = match delta {
            Some(delta) => self.tree.poll_cycle(delta, self.retention, now),
            None => self.tree.expire(self.retention, now),
        };

        let redraw = self.view.write().await.apply(outcome, now);
        Ok(redraw)
    }

    /// Poll forever at `poll_interval`
    pub async fn run(mut self, poll_interval: Duration) {
        log::info!(
            "⏰ Starting poll loop (source: {}, interval: {:?}, retention: {}m)",
            self.source.source_type(),
            poll_interval,
            self.retention.num_minutes()
        );

        let mut timer = interval(poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;

            match self.poll_once().await {
                Ok(redraw) => {
                    if self.backoff.failures() > 0 {
                        log::info!(
                            "✅ Delta source recovered after {} failed polls",
                            self.backoff.failures()
                        );
                    }
                    self.backoff.reset();
                    if redraw {
                        log::debug!(
                            "Redraw: {} gears, {} hits",
                            self.tree.gear_count(),
                            self.tree.hit_count()
                        );
                    }
                }
                Err(e) => {
                    log::warn!("⚠️  Poll failed ({}): {}", self.source.source_type(), e);
                    if let Err(e) = self.backoff.wait().await {
                        log::error!("❌ {}; continuing to poll", e);
                        self.backoff.reset();
                    }
                }
            }
        }
    }

    pub fn tree(&self) -> &HitTree {
        &self.tree
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{ApplicationDelta, GearDelta, HitDelta};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays scripted fetch results
    struct ScriptedSource {
        script: VecDeque<Result<Option<ApplicationDelta>, TransportError>>,
    }

    #[async_trait]
    impl DeltaSource for ScriptedSource {
        async fn fetch(
            &mut self,
            _since: DateTime<Utc>,
        ) -> Result<Option<ApplicationDelta>, TransportError> {
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn source_type(&self) -> &'static str {
            "scripted"
        }
    }

    fn poller_with(
        script: Vec<Result<Option<ApplicationDelta>, TransportError>>,
    ) -> (Poller, Arc<RwLock<HitView>>) {
        let view = Arc::new(RwLock::new(HitView::new("scripted", chrono::Duration::minutes(5))));
        let source = ScriptedSource {
            script: script.into(),
        };
        let poller = Poller::new(Box::new(source), chrono::Duration::minutes(5), view.clone());
        (poller, view)
    }

    fn delta(hit: &str) -> ApplicationDelta {
        ApplicationDelta::new("app1")
            .with_gear(GearDelta::new("g1").with_hit(HitDelta::new(hit, Utc::now(), 2)))
    }

    #[tokio::test]
    async fn test_poll_publishes_on_redraw() {
        let (mut poller, view) = poller_with(vec![Ok(Some(delta("h1"))), Ok(None)]);

        assert!(poller.poll_once().await.unwrap());
        assert_eq!(view.read().await.generation(), 1);
        assert_eq!(view.read().await.total_size(), 2);

        assert!(!poller.poll_once().await.unwrap());
        assert_eq!(view.read().await.generation(), 1);
        assert_eq!(view.read().await.cycles(), 2);
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_tree_and_watermark() {
        let (mut poller, view) = poller_with(vec![
            Ok(Some(delta("h1"))),
            Err(TransportError::Status(502)),
        ]);

        poller.poll_once().await.unwrap();
        let since = poller.since();
        assert!(since > DateTime::<Utc>::UNIX_EPOCH);

        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.since(), since);
        assert_eq!(poller.tree().hit_count(), 1);
        assert_eq!(
            view.read().await.last_error(),
            Some("Unexpected HTTP status: 502")
        );
    }
}
