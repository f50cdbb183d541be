//! Lookup index over tree membership
//!
//! Maps gear uuid → slot in `Application::children` and hit id → owning gear
//! uuid. Every insert or removal of a gear or hit goes through here so the
//! index and the tree never disagree once an operation completes.

use super::model::Gear;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Gear,
    Hit,
}

#[derive(Debug, Default)]
pub struct TreeIndex {
    /// uuid → position in the application's children
    gears: HashMap<String, usize>,
    /// hit id → owning gear uuid (non-owning association)
    hits: HashMap<String, String>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, kind: EntryKind, key: &str) -> bool {
        match kind {
            EntryKind::Gear => self.gears.contains_key(key),
            EntryKind::Hit => self.hits.contains_key(key),
        }
    }

    /// Slot of a gear in the application's children
    pub fn gear_slot(&self, uuid: &str) -> Option<usize> {
        self.gears.get(uuid).copied()
    }

    /// Uuid of the gear that owns a hit
    pub fn hit_owner(&self, id: &str) -> Option<&str> {
        self.hits.get(id).map(String::as_str)
    }

    pub fn put_gear(&mut self, uuid: String, slot: usize) {
        self.gears.insert(uuid, slot);
    }

    pub fn put_hit(&mut self, id: String, owner: String) {
        self.hits.insert(id, owner);
    }

    /// Remove an entry. Removing an absent key is a no-op.
    pub fn remove(&mut self, kind: EntryKind, key: &str) {
        let removed = match kind {
            EntryKind::Gear => self.gears.remove(key).is_some(),
            EntryKind::Hit => self.hits.remove(key).is_some(),
        };

        if !removed {
            log::debug!("Index remove for unknown {:?} '{}' ignored", kind, key);
        }
    }

    /// Rebuild gear slots after the children vector was compacted
    pub fn reslot_gears(&mut self, gears: &[Gear]) {
        for (slot, gear) in gears.iter().enumerate() {
            if let Some(entry) = self.gears.get_mut(&gear.uuid) {
                *entry = slot;
            }
        }
    }

    pub fn gear_count(&self) -> usize {
        self.gears.len()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}
