//! Hit tree engine - incremental merge, eviction and aggregation
//!
//! ## Poll cycle
//!
//! ```text
//! ApplicationDelta
//!     ↓
//! HitTree::merge()        (index-gated insert/append)
//!     ↓
//! HitTree::evict()        (retention window, collapse empty gears)
//!     ↓
//! HitTree::recalculate()  (bottom-up sizes)
//!     ↓
//! HitTree::flatten()      (application, gear, hits..., gear, hits...)
//!     ↓
//! CycleOutcome { redraw, nodes }
//! ```
//!
//! The engine is synchronous and owned by a single caller. Nothing here blocks.

use super::index::{EntryKind, TreeIndex};
use super::model::{Application, FlatNode, Gear, Hit};
use crate::delta::ApplicationDelta;
use chrono::{DateTime, Duration, Utc};

/// Counters collected while running a cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub gears_added: usize,
    pub hits_added: usize,
    /// Malformed or duplicate entities that were ignored
    pub entities_skipped: usize,
    pub hits_evicted: usize,
    pub gears_collapsed: usize,
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// True when the visible structure changed (merge or eviction)
    pub redraw: bool,
    /// Flattened tree, always computed from a settled tree
    pub nodes: Vec<FlatNode>,
    pub stats: CycleStats,
}

/// In-memory application → gear → hit tree with its lookup index
///
/// One instance per visualized application. All membership changes go through
/// [`TreeIndex`], so the index and the tree agree after every public call.
#[derive(Debug)]
pub struct HitTree {
    application: Option<Application>,
    index: TreeIndex,
    /// False between a mutation and the next `recalculate()`
    settled: bool,
}

impl HitTree {
    pub fn new() -> Self {
        Self {
            application: None,
            index: TreeIndex::new(),
            settled: true,
        }
    }

    /// Merge a delta into the tree. Returns true if the structure changed.
    pub fn merge(&mut self, delta: ApplicationDelta) -> bool {
        let mut stats = CycleStats::default();
        self.merge_counted(delta, &mut stats)
    }

    fn merge_counted(&mut self, delta: ApplicationDelta, stats: &mut CycleStats) -> bool {
        let name = match delta.name {
            Some(name) => name,
            None => {
                log::warn!(
                    "Skipping delta without application name ({} gears)",
                    delta.children.len()
                );
                stats.entities_skipped += 1;
                return false;
            }
        };

        let mut dirty = false;

        if self.application.is_none() {
            log::info!("Adopting application '{}'", name);
            self.application = Some(Application::new(name.clone()));
            dirty = true;
        }

        let application = match self.application.as_mut() {
            Some(application) => application,
            None => return dirty,
        };

        // First application seen wins for the lifetime of the tree
        if application.name != name {
            log::debug!(
                "Ignoring delta for application '{}' (tracking '{}')",
                name,
                application.name
            );
            return false;
        }

        for gear_delta in delta.children {
            let uuid = match gear_delta.uuid {
                Some(uuid) => uuid,
                None => {
                    log::warn!(
                        "Skipping gear without uuid ({} hits)",
                        gear_delta.children.len()
                    );
                    stats.entities_skipped += 1;
                    continue;
                }
            };

            let slot = match self.index.gear_slot(&uuid) {
                Some(slot) => slot,
                None => {
                    // Guard against a duplicate insert on rapid successive polls
                    let slot = match application.children.iter().position(|g| g.uuid == uuid) {
                        Some(slot) => slot,
                        None => {
                            application.children.push(Gear::new(uuid.clone()));
                            application.children.len() - 1
                        }
                    };
                    log::debug!("New gear '{}'", uuid);
                    self.index.put_gear(uuid.clone(), slot);
                    stats.gears_added += 1;
                    dirty = true;
                    slot
                }
            };

            let gear = match application.children.get_mut(slot) {
                Some(gear) => gear,
                None => {
                    log::warn!("Index points gear '{}' at missing slot {}", uuid, slot);
                    self.index.remove(EntryKind::Gear, &uuid);
                    continue;
                }
            };

            for hit_delta in gear_delta.children {
                let id = match hit_delta.id {
                    Some(id) => id,
                    None => {
                        log::warn!("Skipping hit without id on gear '{}'", uuid);
                        stats.entities_skipped += 1;
                        continue;
                    }
                };

                let timestamp = match hit_delta.timestamp {
                    Some(timestamp) => timestamp,
                    None => {
                        log::warn!("Skipping hit '{}' without timestamp", id);
                        stats.entities_skipped += 1;
                        continue;
                    }
                };

                if let Some(owner) = self.index.hit_owner(&id) {
                    log::warn!(
                        "Ignoring hit '{}' for gear '{}': already owned by gear '{}'",
                        id,
                        uuid,
                        owner
                    );
                    stats.entities_skipped += 1;
                    continue;
                }

                self.index.put_hit(id.clone(), uuid.clone());
                gear.children.push(Hit::new(id, timestamp, hit_delta.count));
                stats.hits_added += 1;
                dirty = true;
            }
        }

        if dirty {
            self.settled = false;
        }

        dirty
    }

    /// Drop hits older than `retention` and collapse gears left empty.
    /// Returns true if anything was removed.
    pub fn evict(&mut self, retention: Duration, now: DateTime<Utc>) -> bool {
        let mut stats = CycleStats::default();
        self.evict_counted(retention, now, &mut stats)
    }

    fn evict_counted(
        &mut self,
        retention: Duration,
        now: DateTime<Utc>,
        stats: &mut CycleStats,
    ) -> bool {
        let application = match self.application.as_mut() {
            Some(application) => application,
            None => return false,
        };

        let index = &mut self.index;
        let mut hits_evicted = 0;

        for gear in application.children.iter_mut() {
            gear.children.retain(|hit| {
                if hit.age(now) > retention {
                    index.remove(EntryKind::Hit, &hit.id);
                    hits_evicted += 1;
                    false
                } else {
                    true
                }
            });
        }

        let gears_before = application.children.len();
        application.children.retain(|gear| {
            if gear.children.is_empty() {
                log::debug!("Collapsing empty gear '{}'", gear.uuid);
                index.remove(EntryKind::Gear, &gear.uuid);
                false
            } else {
                true
            }
        });
        let gears_collapsed = gears_before - application.children.len();

        if gears_collapsed > 0 {
            index.reslot_gears(&application.children);
        }

        stats.hits_evicted += hits_evicted;
        stats.gears_collapsed += gears_collapsed;

        let dirty = hits_evicted > 0 || gears_collapsed > 0;
        if dirty {
            self.settled = false;
        }
        dirty
    }

    /// Recompute every size bottom-up. Overwrites, so repeated calls are a no-op.
    ///
    /// Sums saturate at `u64::MAX`; counts come straight off the wire.
    pub fn recalculate(&mut self) {
        if let Some(application) = self.application.as_mut() {
            let mut application_size: u64 = 0;

            for gear in application.children.iter_mut() {
                gear.size = 0;
                for hit in gear.children.iter_mut() {
                    hit.size = hit.count;
                    gear.size = gear.size.saturating_add(hit.size);
                }
                application_size = application_size.saturating_add(gear.size);
            }

            application.size = application_size;
        }

        self.settled = true;
    }

    /// Ordered list of live nodes: application, then each gear followed by its hits.
    ///
    /// Only a settled tree is flattened. Sizes are stale between a mutation and
    /// `recalculate()`, so an unsettled tree yields an empty list. `poll_cycle`
    /// and `expire` always settle before flattening.
    pub fn flatten(&self) -> Vec<FlatNode> {
        if !self.settled {
            log::warn!("⚠️  flatten() called before recalculate(); returning no nodes");
            return Vec::new();
        }

        let application = match &self.application {
            Some(application) => application,
            None => return Vec::new(),
        };

        let mut nodes = Vec::with_capacity(1 + self.index.gear_count() + self.index.hit_count());
        nodes.push(FlatNode::Application {
            name: application.name.clone(),
            size: application.size,
        });

        for gear in &application.children {
            nodes.push(FlatNode::Gear {
                uuid: gear.uuid.clone(),
                size: gear.size,
                hit_count: gear.children.len(),
            });

            for hit in &gear.children {
                nodes.push(FlatNode::Hit {
                    id: hit.id.clone(),
                    gear: gear.uuid.clone(),
                    timestamp: hit.timestamp,
                    count: hit.count,
                    size: hit.size,
                });
            }
        }

        nodes
    }

    /// Run a full cycle: merge, evict, recalculate, flatten
    pub fn poll_cycle(
        &mut self,
        delta: ApplicationDelta,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> CycleOutcome {
        let mut stats = CycleStats::default();
        let merged = self.merge_counted(delta, &mut stats);
        self.finish_cycle(merged, retention, now, stats)
    }

    /// Run a cycle with no new delta, so stale hits still age out
    pub fn expire(&mut self, retention: Duration, now: DateTime<Utc>) -> CycleOutcome {
        self.finish_cycle(false, retention, now, CycleStats::default())
    }

    fn finish_cycle(
        &mut self,
        merged: bool,
        retention: Duration,
        now: DateTime<Utc>,
        mut stats: CycleStats,
    ) -> CycleOutcome {
        let evicted = self.evict_counted(retention, now, &mut stats);
        self.recalculate();
        let nodes = self.flatten();

        log::debug!(
            "Cycle: +{} gears, +{} hits, -{} hits, -{} gears, {} skipped, redraw={}",
            stats.gears_added,
            stats.hits_added,
            stats.hits_evicted,
            stats.gears_collapsed,
            stats.entities_skipped,
            merged || evicted
        );

        CycleOutcome {
            redraw: merged || evicted,
            nodes,
            stats,
        }
    }

    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    /// Look up a gear through the index
    pub fn gear(&self, uuid: &str) -> Option<&Gear> {
        let slot = self.index.gear_slot(uuid)?;
        self.application.as_ref()?.children.get(slot)
    }

    /// Uuid of the gear owning a hit
    pub fn hit_owner(&self, id: &str) -> Option<&str> {
        self.index.hit_owner(id)
    }

    pub fn contains(&self, kind: EntryKind, key: &str) -> bool {
        self.index.has(kind, key)
    }

    pub fn gear_count(&self) -> usize {
        self.index.gear_count()
    }

    pub fn hit_count(&self) -> usize {
        self.index.hit_count()
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Check that every gear and hit in the tree is indexed where it lives,
    /// and that the index holds nothing else
    pub fn is_consistent(&self) -> bool {
        let application = match &self.application {
            Some(application) => application,
            None => return self.index.gear_count() == 0 && self.index.hit_count() == 0,
        };

        let mut hits = 0;
        for (slot, gear) in application.children.iter().enumerate() {
            if self.index.gear_slot(&gear.uuid) != Some(slot) {
                return false;
            }
            for hit in &gear.children {
                if self.index.hit_owner(&hit.id) != Some(gear.uuid.as_str()) {
                    return false;
                }
                hits += 1;
            }
        }

        self.index.gear_count() == application.children.len() && self.index.hit_count() == hits
    }
}

impl Default for HitTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{GearDelta, HitDelta};

    fn single_hit_delta(app: &str, gear: &str, hit: &str, at: DateTime<Utc>, count: u64) -> ApplicationDelta {
        ApplicationDelta::new(app).with_gear(GearDelta::new(gear).with_hit(HitDelta::new(hit, at, count)))
    }

    fn keys(nodes: &[FlatNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.key()).collect()
    }

    #[test]
    fn test_first_merge_adopts_application() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        assert!(tree.merge(single_hit_delta("app1", "g1", "h1", now, 5)));
        tree.recalculate();

        assert_eq!(keys(&tree.flatten()), vec!["app1", "g1", "h1"]);
        assert_eq!(tree.application().unwrap().size, 5);
        assert_eq!(tree.gear("g1").unwrap().size, 5);
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_new_hit_on_known_gear_is_structural() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        tree.merge(single_hit_delta("app1", "g1", "h1", now, 5));
        assert!(tree.merge(single_hit_delta("app1", "g1", "h2", now, 3)));
        tree.recalculate();

        assert_eq!(tree.gear("g1").unwrap().size, 8);
        assert_eq!(tree.application().unwrap().size, 8);
        assert_eq!(tree.hit_owner("h2"), Some("g1"));
    }

    #[test]
    fn test_reannounced_gear_is_not_dirty() {
        let mut tree = HitTree::new();

        assert!(tree.merge(ApplicationDelta::new("app1").with_gear(GearDelta::new("g1"))));
        assert!(!tree.merge(ApplicationDelta::new("app1").with_gear(GearDelta::new("g1"))));

        assert_eq!(tree.gear_count(), 1);
        assert_eq!(tree.application().unwrap().children.len(), 1);
    }

    #[test]
    fn test_other_application_ignored() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        tree.merge(single_hit_delta("app1", "g1", "h1", now, 1));
        assert!(!tree.merge(single_hit_delta("app2", "g2", "h2", now, 1)));

        assert_eq!(tree.application().unwrap().name, "app1");
        assert!(!tree.contains(EntryKind::Gear, "g2"));
        assert!(!tree.contains(EntryKind::Hit, "h2"));
    }

    #[test]
    fn test_malformed_entities_skipped() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        let delta = ApplicationDelta::new("app1")
            .with_gear(GearDelta {
                uuid: None,
                children: vec![HitDelta::new("orphan", now, 1)],
            })
            .with_gear(
                GearDelta::new("g1")
                    .with_hit(HitDelta {
                        id: None,
                        timestamp: Some(now),
                        count: 1,
                    })
                    .with_hit(HitDelta {
                        id: Some("no_time".to_string()),
                        timestamp: None,
                        count: 1,
                    })
                    .with_hit(HitDelta::new("h1", now, 2)),
            );

        let outcome = tree.poll_cycle(delta, Duration::minutes(5), now);

        assert!(outcome.redraw);
        assert_eq!(outcome.stats.entities_skipped, 3);
        assert_eq!(keys(&outcome.nodes), vec!["app1", "g1", "h1"]);
        assert!(!tree.contains(EntryKind::Hit, "orphan"));
    }

    #[test]
    fn test_delta_without_name_skipped() {
        let mut tree = HitTree::new();
        let delta = ApplicationDelta {
            name: None,
            children: vec![GearDelta::new("g1")],
        };

        assert!(!tree.merge(delta));
        assert!(tree.application().is_none());
        assert_eq!(tree.gear_count(), 0);
    }

    #[test]
    fn test_evict_keeps_order_of_survivors() {
        let mut tree = HitTree::new();
        let now = Utc::now();
        let old = now - Duration::minutes(10);

        let delta = ApplicationDelta::new("app1").with_gear(
            GearDelta::new("g1")
                .with_hit(HitDelta::new("h1", now, 1))
                .with_hit(HitDelta::new("h2", old, 1))
                .with_hit(HitDelta::new("h3", now, 1))
                .with_hit(HitDelta::new("h4", old, 1))
                .with_hit(HitDelta::new("h5", now, 1)),
        );
        tree.merge(delta);

        assert!(tree.evict(Duration::minutes(5), now));
        tree.recalculate();

        assert_eq!(keys(&tree.flatten()), vec!["app1", "g1", "h1", "h3", "h5"]);
        assert!(tree.hit_owner("h2").is_none());
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_evict_boundary_is_inclusive() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        tree.merge(single_hit_delta("app1", "g1", "h1", now - Duration::minutes(1), 1));

        assert!(!tree.evict(Duration::minutes(1), now));
        assert!(tree.contains(EntryKind::Hit, "h1"));
    }

    #[test]
    fn test_collapse_reslots_surviving_gears() {
        let mut tree = HitTree::new();
        let now = Utc::now();
        let old = now - Duration::minutes(10);

        let delta = ApplicationDelta::new("app1")
            .with_gear(GearDelta::new("g1").with_hit(HitDelta::new("h1", old, 1)))
            .with_gear(GearDelta::new("g2").with_hit(HitDelta::new("h2", now, 1)))
            .with_gear(GearDelta::new("g3").with_hit(HitDelta::new("h3", now, 1)));
        tree.merge(delta);

        assert!(tree.evict(Duration::minutes(5), now));
        assert_eq!(tree.gear("g2").unwrap().uuid, "g2");
        assert_eq!(tree.gear("g3").unwrap().uuid, "g3");
        assert!(tree.gear("g1").is_none());
        assert!(tree.is_consistent());

        // Hits still land on the right gear after reslotting
        tree.merge(single_hit_delta("app1", "g3", "h4", now, 1));
        assert_eq!(tree.gear("g3").unwrap().children.len(), 2);
        assert_eq!(tree.gear("g2").unwrap().children.len(), 1);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        tree.merge(single_hit_delta("app1", "g1", "h1", now, 4));
        tree.recalculate();
        let first = tree.flatten();
        tree.recalculate();

        assert_eq!(first, tree.flatten());
        assert_eq!(tree.application().unwrap().size, 4);
    }

    #[test]
    fn test_mutation_unsettles_tree() {
        let mut tree = HitTree::new();
        assert!(tree.is_settled());

        tree.merge(single_hit_delta("app1", "g1", "h1", Utc::now(), 1));
        assert!(!tree.is_settled());

        tree.recalculate();
        assert!(tree.is_settled());
    }

    #[test]
    fn test_recalculate_saturates_huge_counts() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        let delta = ApplicationDelta::new("app1")
            .with_gear(
                GearDelta::new("g1")
                    .with_hit(HitDelta::new("h1", now, u64::MAX))
                    .with_hit(HitDelta::new("h2", now, 1)),
            )
            .with_gear(GearDelta::new("g2").with_hit(HitDelta::new("h3", now, 7)));
        let outcome = tree.poll_cycle(delta, Duration::minutes(5), now);

        assert!(outcome.redraw);
        assert_eq!(tree.gear("g1").unwrap().size, u64::MAX);
        assert_eq!(tree.gear("g2").unwrap().size, 7);
        assert_eq!(tree.application().unwrap().size, u64::MAX);
        assert_eq!(outcome.nodes[0].size(), u64::MAX);
    }

    #[test]
    fn test_flatten_unsettled_tree_is_empty() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        tree.poll_cycle(single_hit_delta("app1", "g1", "h1", now, 2), Duration::minutes(5), now);
        tree.merge(single_hit_delta("app1", "g1", "h2", now, 3));

        assert!(tree.flatten().is_empty());

        tree.recalculate();
        assert_eq!(keys(&tree.flatten()), vec!["app1", "g1", "h1", "h2"]);
    }

    #[test]
    fn test_flatten_empty_tree() {
        let tree = HitTree::new();
        assert!(tree.flatten().is_empty());
    }

    #[test]
    fn test_expire_without_stale_hits() {
        let mut tree = HitTree::new();
        let now = Utc::now();
        tree.poll_cycle(single_hit_delta("app1", "g1", "h1", now, 1), Duration::minutes(5), now);

        let outcome = tree.expire(Duration::minutes(5), now);
        assert!(!outcome.redraw);
        assert_eq!(outcome.nodes.len(), 3);
    }

    #[test]
    fn test_same_gear_twice_in_one_delta() {
        let mut tree = HitTree::new();
        let now = Utc::now();

        let delta = ApplicationDelta::new("app1")
            .with_gear(GearDelta::new("g1").with_hit(HitDelta::new("h1", now, 1)))
            .with_gear(GearDelta::new("g1").with_hit(HitDelta::new("h2", now, 1)));
        tree.merge(delta);

        assert_eq!(tree.gear_count(), 1);
        assert_eq!(tree.gear("g1").unwrap().children.len(), 2);
    }
}
