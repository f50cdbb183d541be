//! Collapse and selection state for the tree table
//!
//! Collapsing is an explicit flag per node (kept here, keyed by node kind and
//! key). The flattened list from the engine is never rearranged.

use crate::tree::FlatNode;
use std::collections::HashSet;

/// A node as it appears in the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow<'a> {
    pub node: &'a FlatNode,
    pub collapsed: bool,
}

#[derive(Debug, Default)]
pub struct Outline {
    collapsed: HashSet<(&'static str, String)>,
    selected: usize,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, node: &FlatNode) -> bool {
        node.is_branch() && self.collapsed.contains(&(node.kind(), node.key().to_string()))
    }

    /// Rows left after hiding descendants of collapsed nodes
    pub fn visible_rows<'a>(&self, nodes: &'a [FlatNode]) -> Vec<VisibleRow<'a>> {
        let mut rows = Vec::with_capacity(nodes.len());
        let mut hidden_below: Option<usize> = None;

        for node in nodes {
            let depth = node.depth();
            if let Some(limit) = hidden_below {
                if depth > limit {
                    continue;
                }
                hidden_below = None;
            }

            let collapsed = self.is_collapsed(node);
            rows.push(VisibleRow { node, collapsed });

            if collapsed {
                hidden_below = Some(depth);
            }
        }

        rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self, visible: usize) {
        if visible > 0 {
            self.selected = (self.selected + 1).min(visible - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Toggle collapse on the selected row. Returns true if something changed.
    pub fn toggle_selected(&mut self, nodes: &[FlatNode]) -> bool {
        let node = match self.visible_rows(nodes).get(self.selected) {
            Some(row) if row.node.is_branch() => row.node,
            _ => return false,
        };

        let key = (node.kind(), node.key().to_string());
        if !self.collapsed.remove(&key) {
            self.collapsed.insert(key);
        }
        true
    }

    /// Forget collapse flags of nodes that were evicted and clamp the selection
    pub fn sync(&mut self, nodes: &[FlatNode]) {
        self.collapsed
            .retain(|(kind, key)| nodes.iter().any(|n| n.kind() == *kind && n.key() == key));

        let visible = self.visible_rows(nodes).len();
        self.selected = self.selected.min(visible.saturating_sub(1));
    }
}
