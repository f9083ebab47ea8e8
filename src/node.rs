//! Node kinds and their local operations.
//!
//! A tree is a hierarchy of [`Directory`] tables whose slots hold
//! [`ChildRef`]s: either a sub-directory, a small tag-probed bucket
//! ([`LeafNode`]), or a growable overflow bucket ([`VectorNode`]). Ownership
//! is strictly tree-shaped through `ChildRef`; the parent back-references
//! directories carry are non-owning and used for traversal only.

use std::cell::Cell;
use std::cmp::Ordering;
use std::ptr::NonNull;

use crate::keys::KeyHash;
use crate::utils::tag_scan::tag_mask;

/// Bits consumed per split when a new directory is spliced in.
pub(crate) const STEP_BITS: u32 = 2;

/// Arity of a freshly allocated root directory.
pub(crate) const ROOT_BITS: u32 = 4;

/// A directory never merges past this arity.
pub(crate) const MAX_DIR_BITS: u32 = 16;

/// Descent cap for keys without a finite bit budget; pairs of distinct keys
/// whose windows collide this deep land in a vector bucket.
pub(crate) const MAX_UNBOUNDED_DEPTH: usize = 64;

/// Byte footprint cap for a leaf bucket's tag + entry arrays.
pub(crate) const LEAF_FOOTPRINT: usize = 512;

/// A split never records more skipped bits than this in one prefix.
pub(crate) const MAX_PREFIX_BITS: usize = 128;

const fn clamp(v: usize, lo: usize, hi: usize) -> usize {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

const fn floor_pow2(v: usize) -> usize {
    if v == 0 {
        1
    } else {
        1 << (usize::BITS - 1 - v.leading_zeros())
    }
}

/// A directory slot: empty, or owning exactly one node.
pub(crate) enum ChildRef<K: KeyHash, V> {
    Empty,
    Dir(Box<Directory<K, V>>),
    Leaf(Box<LeafNode<K, V>>),
    Vector(Box<VectorNode<K, V>>),
}

impl<K: KeyHash, V> ChildRef<K, V> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, ChildRef::Empty)
    }

    #[inline]
    pub(crate) fn is_dir(&self) -> bool {
        matches!(self, ChildRef::Dir(_))
    }

    /// Number of entries if this slot holds a bucket; panics on directories.
    pub(crate) fn bucket_len(&self) -> usize {
        match self {
            ChildRef::Empty => 0,
            ChildRef::Leaf(l) => l.len(),
            ChildRef::Vector(v) => v.len(),
            ChildRef::Dir(_) => unreachable!("bucket_len on a directory"),
        }
    }

    pub(crate) fn bucket_entry(&self, pos: usize) -> (&K, &V) {
        match self {
            ChildRef::Leaf(l) => l.entry(pos),
            ChildRef::Vector(v) => v.entry(pos),
            _ => unreachable!("bucket_entry on a non-bucket"),
        }
    }
}

/// A small bucket: a parallel tag array and entry array.
///
/// Membership probes scan the one-byte tags first and only compare full keys
/// on tag hits. Capacity is kept a power of two between a size-derived floor
/// and ceiling so the probe footprint stays within [`LEAF_FOOTPRINT`].
/// Ordered keys keep the entry array ascending; opaque keys append.
pub(crate) struct LeafNode<K: KeyHash, V> {
    tags: Vec<u8>,
    entries: Vec<(K, V)>,
}

impl<K: KeyHash, V> LeafNode<K, V> {
    const ENTRY_SIZE: usize = std::mem::size_of::<(K, V)>() + 1;

    pub(crate) const MAX_CAP: usize = floor_pow2(clamp(LEAF_FOOTPRINT / Self::ENTRY_SIZE, 2, 16));

    const INITIAL_CAP: usize = floor_pow2(clamp(64 / Self::ENTRY_SIZE, 1, 4));

    pub(crate) fn boxed(tag: u8, key: K, value: V) -> Box<Self> {
        let mut tags = Vec::with_capacity(Self::INITIAL_CAP);
        let mut entries = Vec::with_capacity(Self::INITIAL_CAP);
        tags.push(tag);
        entries.push((key, value));
        Box::new(Self { tags, entries })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub(crate) fn has_room(&self) -> bool {
        self.entries.len() < Self::MAX_CAP
    }

    pub(crate) fn entry(&self, pos: usize) -> (&K, &V) {
        let (k, v) = &self.entries[pos];
        (k, v)
    }

    pub(crate) fn value_mut(&mut self, pos: usize) -> &mut V {
        &mut self.entries[pos].1
    }

    /// Position of `key`, or `None`. Probes the tag array first.
    pub(crate) fn find(&self, tag: u8, key: &K) -> Option<usize> {
        let mut mask = tag_mask(&self.tags, tag);
        while mask != 0 {
            let pos = mask.trailing_zeros() as usize;
            if self.entries[pos].0 == *key {
                return Some(pos);
            }
            mask &= mask - 1;
        }
        None
    }

    /// Insert an entry known to be absent. Callers check `has_room` first.
    pub(crate) fn insert(&mut self, tag: u8, key: K, value: V) {
        debug_assert!(self.has_room());
        if self.entries.len() == self.entries.capacity() {
            // Doubling by hand keeps the capacity a power of two.
            self.tags.reserve_exact(self.tags.len());
            self.entries.reserve_exact(self.entries.len());
        }
        let pos = if K::ORDERED {
            self.entries
                .partition_point(|(k, _)| k.compare(&key) == Ordering::Less)
        } else {
            self.entries.len()
        };
        self.tags.insert(pos, tag);
        self.entries.insert(pos, (key, value));
    }

    pub(crate) fn replace_value(&mut self, pos: usize, value: V) -> V {
        std::mem::replace(&mut self.entries[pos].1, value)
    }

    pub(crate) fn remove(&mut self, pos: usize) -> (K, V) {
        self.tags.remove(pos);
        let out = self.entries.remove(pos);
        let cap = self.entries.capacity();
        if cap > Self::INITIAL_CAP && self.entries.len() * 2 < cap {
            self.tags.shrink_to(cap / 2);
            self.entries.shrink_to(cap / 2);
        }
        out
    }

    /// First position whose key is >= `key` (or > with `strict`). Sorted
    /// buckets only.
    pub(crate) fn seek(&self, key: &K, strict: bool) -> usize {
        debug_assert!(K::ORDERED);
        self.entries.partition_point(|(k, _)| {
            let ord = k.compare(key);
            ord == Ordering::Less || (strict && ord == Ordering::Equal)
        })
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

/// The overflow bucket used once splitting is no longer possible: the key's
/// bit budget ran out, or the depth cap was hit. Grows without bound and is
/// never converted back.
pub(crate) struct VectorNode<K: KeyHash, V> {
    entries: Vec<(K, V)>,
}

impl<K: KeyHash, V> VectorNode<K, V> {
    pub(crate) fn from_entries(mut entries: Vec<(K, V)>) -> Box<Self> {
        if K::ORDERED {
            entries.sort_by(|(a, _), (b, _)| a.compare(b));
        }
        Box::new(Self { entries })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&self, pos: usize) -> (&K, &V) {
        let (k, v) = &self.entries[pos];
        (k, v)
    }

    pub(crate) fn value_mut(&mut self, pos: usize) -> &mut V {
        &mut self.entries[pos].1
    }

    pub(crate) fn find(&self, key: &K) -> Option<usize> {
        if K::ORDERED {
            self.entries
                .binary_search_by(|(k, _)| k.compare(key))
                .ok()
                .filter(|pos| self.entries[*pos].0 == *key)
        } else {
            self.entries.iter().position(|(k, _)| k == key)
        }
    }

    /// Insert an entry known to be absent.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let pos = if K::ORDERED {
            self.entries
                .partition_point(|(k, _)| k.compare(&key) == Ordering::Less)
        } else {
            self.entries.len()
        };
        self.entries.insert(pos, (key, value));
    }

    pub(crate) fn replace_value(&mut self, pos: usize, value: V) -> V {
        std::mem::replace(&mut self.entries[pos].1, value)
    }

    pub(crate) fn remove(&mut self, pos: usize) -> (K, V) {
        self.entries.remove(pos)
    }

    pub(crate) fn seek(&self, key: &K, strict: bool) -> usize {
        debug_assert!(K::ORDERED);
        self.entries.partition_point(|(k, _)| {
            let ord = k.compare(key);
            ord == Ordering::Less || (strict && ord == Ordering::Equal)
        })
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

const SLOT_UNKNOWN: u32 = u32::MAX;

/// A fan-out table of `2^hash_len` child slots.
///
/// `prefix_len` counts key bits skipped by path compression directly above
/// this table; the skipped bits are not stored and are recovered from any
/// key under the subtree. The parent back-reference exists for cursor and
/// offset arithmetic only.
pub(crate) struct Directory<K: KeyHash, V> {
    pub(crate) hash_len: u32,
    pub(crate) prefix_len: u32,
    pub(crate) child_count: u32,
    pub(crate) dir_count: u32,
    pub(crate) parent: Option<NonNull<Directory<K, V>>>,
    pub(crate) parent_slot: u32,
    first_slot: Cell<u32>,
    pub(crate) children: Box<[ChildRef<K, V>]>,
}

impl<K: KeyHash, V> Directory<K, V> {
    pub(crate) fn new(hash_len: u32, prefix_len: u32) -> Box<Self> {
        debug_assert!(hash_len >= 1 && hash_len <= MAX_DIR_BITS);
        debug_assert!(prefix_len % STEP_BITS == 0);
        let children = (0..1u32 << hash_len).map(|_| ChildRef::Empty).collect();
        Box::new(Self {
            hash_len,
            prefix_len,
            child_count: 0,
            dir_count: 0,
            parent: None,
            parent_slot: 0,
            first_slot: Cell::new(SLOT_UNKNOWN),
            children,
        })
    }

    #[inline]
    pub(crate) fn size(&self) -> u32 {
        1 << self.hash_len
    }

    /// Fill an empty slot.
    pub(crate) fn install(&mut self, slot: u32, child: ChildRef<K, V>) {
        debug_assert!(self.children[slot as usize].is_empty());
        debug_assert!(!child.is_empty());
        self.child_count += 1;
        if child.is_dir() {
            self.dir_count += 1;
        }
        self.children[slot as usize] = child;
        self.adopt(slot);
        let cached = self.first_slot.get();
        if cached != SLOT_UNKNOWN && slot < cached {
            self.first_slot.set(slot);
        }
    }

    /// Empty a slot, returning what it held.
    pub(crate) fn clear_slot(&mut self, slot: u32) -> ChildRef<K, V> {
        debug_assert!(!self.children[slot as usize].is_empty());
        self.child_count -= 1;
        if self.children[slot as usize].is_dir() {
            self.dir_count -= 1;
        }
        if self.first_slot.get() == slot {
            self.first_slot.set(SLOT_UNKNOWN);
        }
        std::mem::replace(&mut self.children[slot as usize], ChildRef::Empty)
    }

    /// Repoint a child directory's back-reference at this table. Must run
    /// after any move that changes where the child lives.
    pub(crate) fn adopt(&mut self, slot: u32) {
        let me = NonNull::from(&mut *self);
        if let ChildRef::Dir(d) = &mut self.children[slot as usize] {
            d.parent = Some(me);
            d.parent_slot = slot;
        }
    }

    pub(crate) fn first_occupied(&self) -> Option<u32> {
        let cached = self.first_slot.get();
        if cached != SLOT_UNKNOWN {
            debug_assert!(!self.children[cached as usize].is_empty());
            return Some(cached);
        }
        let found = self.next_occupied(0)?;
        self.first_slot.set(found);
        Some(found)
    }

    /// First occupied slot at or after `from`.
    pub(crate) fn next_occupied(&self, from: u32) -> Option<u32> {
        (from..self.size()).find(|s| !self.children[*s as usize].is_empty())
    }

    /// Last occupied slot at or before `upto`.
    pub(crate) fn prev_occupied(&self, upto: u32) -> Option<u32> {
        (0..=upto.min(self.size() - 1))
            .rev()
            .find(|s| !self.children[*s as usize].is_empty())
    }

    /// Any entry under this subtree; used to recover compressed prefix bits.
    pub(crate) fn first_entry(&self) -> (&K, &V) {
        let mut dir = self;
        loop {
            let slot = dir
                .first_occupied()
                .expect("directory has at least one child");
            match &dir.children[slot as usize] {
                ChildRef::Dir(d) => dir = d,
                child => return child.bucket_entry(0),
            }
        }
    }

    /// Bit offset at which this directory's slot-selection window starts.
    /// Walks the parent chain, so it costs one step per ancestor.
    pub(crate) fn bit_offset(&self) -> usize {
        let mut off = self.prefix_len as usize;
        let mut cur = self.parent;
        while let Some(p) = cur {
            // Traversal-only back-reference; ancestors outlive self.
            let p = unsafe { p.as_ref() };
            off += (p.hash_len + p.prefix_len) as usize;
            cur = p.parent;
        }
        off
    }
}
