//! Structural introspection: node and occupancy census for a tree.

use std::collections::HashMap;

use crate::keys::KeyHash;
use crate::node::{ChildRef, Directory};
use crate::tree::VartTree;

/// Census of the directories sharing one arity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirStats {
    pub count: usize,
    pub total_slots: usize,
    pub total_children: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TreeStats {
    pub num_entries: usize,
    pub num_directories: usize,
    pub num_leaves: usize,
    pub num_vectors: usize,
    pub max_depth: usize,
    /// Directory census keyed by `hash_len`.
    pub arity_census: HashMap<u32, DirStats>,
    /// Occupied slots over total slots, across every directory.
    pub total_density: f64,
}

pub trait TreeStatsTrait {
    fn get_tree_stats(&self) -> TreeStats;
}

impl<K: KeyHash, V> TreeStatsTrait for VartTree<K, V> {
    fn get_tree_stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if let Some(root) = self.root.as_deref() {
            walk(root, 1, &mut stats);
        }
        let (slots, children) = stats
            .arity_census
            .values()
            .fold((0usize, 0usize), |(s, c), d| {
                (s + d.total_slots, c + d.total_children)
            });
        if slots > 0 {
            stats.total_density = children as f64 / slots as f64;
        }
        stats
    }
}

fn walk<K: KeyHash, V>(dir: &Directory<K, V>, depth: usize, stats: &mut TreeStats) {
    stats.num_directories += 1;
    stats.max_depth = stats.max_depth.max(depth);
    let census = stats.arity_census.entry(dir.hash_len).or_default();
    census.count += 1;
    census.total_slots += dir.size() as usize;
    census.total_children += dir.child_count as usize;

    for child in dir.children.iter() {
        match child {
            ChildRef::Empty => {}
            ChildRef::Dir(c) => walk(c, depth + 1, stats),
            ChildRef::Leaf(l) => {
                stats.num_leaves += 1;
                stats.num_entries += l.len();
            }
            ChildRef::Vector(vn) => {
                stats.num_vectors += 1;
                stats.num_entries += vn.len();
            }
        }
    }
}
