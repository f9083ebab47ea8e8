//! The tree engine: a multi-way trie whose fan-out grows where the data is
//! dense.
//!
//! Keys are consumed as MSB-first bit windows (see [`KeyHash`]). Each
//! [`Directory`] consumes `hash_len` bits; runs of bits shared by every key
//! under a subtree are skipped via `prefix_len` and recovered from any
//! resident key when needed. Entries live in small tag-probed buckets at the
//! fringe. Full buckets split into new two-bit directories; directories whose
//! every slot holds a sub-directory merge with all of them into one table
//! four times as wide, so hot regions flatten toward a shallow, high-arity
//! shape.
//!
//! ## Example
//!
//! ```rust
//! use vart::VartTree;
//! use vart::keys::bytes_key::BytesKey;
//!
//! let mut tree: VartTree<BytesKey, i32> = VartTree::new();
//! tree.insert("apple", 1);
//! tree.insert("apricot", 2);
//! tree.insert("banana", 3);
//!
//! assert_eq!(tree.get("apricot"), Some(&2));
//! assert_eq!(tree.prefix(b"ap").count(), 2);
//! let first = tree.iter().next().unwrap();
//! assert_eq!(first.0.as_bytes(), b"apple");
//! ```

use std::ops::{Bound, RangeBounds};
use std::ptr::NonNull;

use crate::iter::{Cursor, Iter, PrefixIter};
use crate::keys::{KeyHash, OrderedKey, PrefixKey};
use crate::node::{
    ChildRef, Directory, LeafNode, VectorNode, MAX_DIR_BITS, MAX_PREFIX_BITS,
    MAX_UNBOUNDED_DEPTH, ROOT_BITS, STEP_BITS,
};
use crate::range::Range;

pub struct VartTree<K: KeyHash, V> {
    pub(crate) root: Option<Box<Directory<K, V>>>,
    root_bits: u32,
    len: usize,
}

// All interior pointers stay within the owned node graph, so the tree can
// move between threads. Not `Sync`: directories carry a `Cell` slot cache
// that shared lookups may refresh.
unsafe impl<K: KeyHash + Send, V: Send> Send for VartTree<K, V> {}

enum InsertResult<K, V> {
    Inserted,
    Replaced(V),
    Duplicate(K, V),
}

/// One descent step, decided by inspection before any mutation.
enum Step {
    NewLeaf,
    Descend { skip: usize },
    Splice { matched: usize, old_slot: u32 },
    LeafHit(usize),
    LeafInsert,
    LeafSplit,
    Vectorize,
    VecFound(usize),
    VecInsert,
}

/// Restores the empty state if tree surgery unwinds partway, which can only
/// happen from a panicking user key implementation. Forgotten on success.
struct ResetOnUnwind<K: KeyHash, V> {
    tree: *mut VartTree<K, V>,
}

impl<K: KeyHash, V> Drop for ResetOnUnwind<K, V> {
    fn drop(&mut self) {
        let tree = unsafe { &mut *self.tree };
        tree.root = None;
        tree.len = 0;
    }
}

impl<K: KeyHash, V> Default for VartTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyHash, V> VartTree<K, V> {
    pub fn new() -> Self {
        Self {
            root: None,
            root_bits: ROOT_BITS,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert with replace semantics: an existing entry for the key has its
    /// value swapped out and returned.
    pub fn insert<Q: Into<K>>(&mut self, key: Q, value: V) -> Option<V> {
        self.insert_k(key.into(), value)
    }

    pub fn insert_k(&mut self, key: K, value: V) -> Option<V> {
        match self.insert_impl(key, value, true) {
            InsertResult::Inserted => None,
            InsertResult::Replaced(old) => Some(old),
            InsertResult::Duplicate(..) => unreachable!(),
        }
    }

    /// Insert only if the key is absent; a duplicate hands the pair back
    /// untouched.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        match self.insert_impl(key, value, false) {
            InsertResult::Inserted => Ok(()),
            InsertResult::Duplicate(k, v) => Err((k, v)),
            InsertResult::Replaced(_) => unreachable!(),
        }
    }

    pub fn get<Q: Into<K>>(&self, key: Q) -> Option<&V> {
        self.get_k(&key.into())
    }

    pub fn get_k(&self, key: &K) -> Option<&V> {
        let mut dir: &Directory<K, V> = self.root.as_deref()?;
        let mut offset = 0usize;
        loop {
            let slot = key.bits(offset, dir.hash_len);
            let entry_off = offset + dir.hash_len as usize;
            match &dir.children[slot as usize] {
                ChildRef::Empty => return None,
                // No need to verify compressed prefixes on the way down: a
                // mismatched descent just fails the bucket equality check.
                ChildRef::Dir(c) => {
                    offset = entry_off + c.prefix_len as usize;
                    dir = c;
                }
                ChildRef::Leaf(l) => return l.find(key.tiny(), key).map(|p| l.entry(p).1),
                ChildRef::Vector(vn) => return vn.find(key).map(|p| vn.entry(p).1),
            }
        }
    }

    pub fn get_mut<Q: Into<K>>(&mut self, key: Q) -> Option<&mut V> {
        self.get_mut_k(&key.into())
    }

    pub fn get_mut_k(&mut self, key: &K) -> Option<&mut V> {
        let mut dir = NonNull::from(&mut **self.root.as_mut()?);
        let mut offset = 0usize;
        loop {
            let d = unsafe { dir.as_mut() };
            let slot = key.bits(offset, d.hash_len);
            let entry_off = offset + d.hash_len as usize;
            match &mut d.children[slot as usize] {
                ChildRef::Empty => return None,
                ChildRef::Dir(c) => {
                    offset = entry_off + c.prefix_len as usize;
                    dir = NonNull::from(&mut **c);
                }
                ChildRef::Leaf(l) => {
                    let pos = l.find(key.tiny(), key)?;
                    return Some(l.value_mut(pos));
                }
                ChildRef::Vector(vn) => {
                    let pos = vn.find(key)?;
                    return Some(vn.value_mut(pos));
                }
            }
        }
    }

    pub fn contains_key<Q: Into<K>>(&self, key: Q) -> bool {
        self.get_k(&key.into()).is_some()
    }

    pub fn remove<Q: Into<K>>(&mut self, key: Q) -> Option<V> {
        self.remove_k(&key.into())
    }

    pub fn remove_k(&mut self, key: &K) -> Option<V> {
        let mut dir = NonNull::from(&mut **self.root.as_mut()?);
        let mut offset = 0usize;
        let (slot, pos) = loop {
            let d = unsafe { dir.as_mut() };
            let slot = key.bits(offset, d.hash_len);
            let entry_off = offset + d.hash_len as usize;
            match &mut d.children[slot as usize] {
                ChildRef::Empty => return None,
                ChildRef::Dir(c) => {
                    offset = entry_off + c.prefix_len as usize;
                    dir = NonNull::from(&mut **c);
                }
                ChildRef::Leaf(l) => break (slot, l.find(key.tiny(), key)?),
                ChildRef::Vector(vn) => break (slot, vn.find(key)?),
            }
        };

        let d = unsafe { dir.as_mut() };
        let (value, emptied) = match &mut d.children[slot as usize] {
            ChildRef::Leaf(l) => {
                let (_, v) = l.remove(pos);
                (v, l.is_empty())
            }
            ChildRef::Vector(vn) => {
                let (_, v) = vn.remove(pos);
                (v, vn.is_empty())
            }
            _ => unreachable!(),
        };
        self.len -= 1;

        if emptied {
            let survivor = unsafe { Self::prune(dir, slot) };
            if self.len == 0 {
                self.root = None;
                return Some(value);
            }
            if K::ORDERED {
                let (cc, size) = {
                    let s = unsafe { survivor.as_ref() };
                    (s.child_count, s.size())
                };
                // Fire once, on crossing below half occupancy.
                if 2 * cc < size && 2 * (cc + 1) >= size {
                    self.rebalance(survivor);
                }
            }
        }
        Some(value)
    }

    /// Move every entry of `other` into `self`. Keys already present stay
    /// behind in `other`, untouched.
    pub fn merge(&mut self, other: &mut Self) {
        let Some(root) = other.root.take() else {
            return;
        };
        let mut entries = Vec::with_capacity(other.len);
        Self::collect_dir(root, &mut entries);
        other.len = 0;
        for (k, v) in entries {
            if let InsertResult::Duplicate(k, v) = self.insert_impl(k, v, false) {
                let dup = other.insert_impl(k, v, false);
                debug_assert!(matches!(dup, InsertResult::Inserted));
            }
        }
    }

    /// Remove every entry whose key falls within `range`. Returns how many
    /// entries were removed.
    pub fn remove_range<R: RangeBounds<K>>(&mut self, range: R) -> usize
    where
        K: OrderedKey,
    {
        let doomed: Vec<K> = self.range(range).map(|(k, _)| k.clone()).collect();
        for k in &doomed {
            let removed = self.remove_k(k);
            debug_assert!(removed.is_some());
        }
        doomed.len()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        match self.root.as_deref() {
            Some(root) => Iter::new(root),
            None => Iter::empty(),
        }
    }

    /// First entry with key >= `key`, as a resumable iterator.
    pub fn lower_bound(&self, key: &K) -> Iter<'_, K, V>
    where
        K: OrderedKey,
    {
        self.bound(key, false)
    }

    /// First entry with key > `key`.
    pub fn upper_bound(&self, key: &K) -> Iter<'_, K, V>
    where
        K: OrderedKey,
    {
        self.bound(key, true)
    }

    fn bound(&self, key: &K, strict: bool) -> Iter<'_, K, V>
    where
        K: OrderedKey,
    {
        match self.root.as_deref() {
            Some(root) => Iter::with_front(self.seek_cursor(key, strict), root),
            None => Iter::empty(),
        }
    }

    /// Entries whose keys start with the given byte prefix, ascending.
    pub fn prefix(&self, prefix: &[u8]) -> PrefixIter<'_, K, V>
    where
        K: PrefixKey,
    {
        let seed = K::from_prefix(prefix);
        PrefixIter::new(self.lower_bound(&seed), prefix.into())
    }

    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Range<'_, K, V>
    where
        K: OrderedKey,
    {
        let iter = match range.start_bound() {
            Bound::Unbounded => self.iter(),
            Bound::Included(start) => self.lower_bound(start),
            Bound::Excluded(start) => self.upper_bound(start),
        };
        Range::new(iter, range.end_bound().cloned())
    }

    /// Rebuild around a root table sized for an expected population of `n`.
    pub fn reserve(&mut self, n: usize)
    where
        K: OrderedKey,
    {
        let bits = Self::root_bits_for(n);
        if bits != self.root_bits || self.root.is_some() {
            self.rebuild(bits);
        }
    }

    /// Rebuild around a root table sized for the current population; also
    /// drops the slack that grow-only buckets accumulate.
    pub fn shrink_to_fit(&mut self)
    where
        K: OrderedKey,
    {
        self.rebuild(Self::root_bits_for(self.len));
    }

    fn root_bits_for(n: usize) -> u32 {
        let mut bits = ROOT_BITS;
        while bits + STEP_BITS <= MAX_DIR_BITS && (1usize << bits) * 8 < n {
            bits += STEP_BITS;
        }
        bits
    }

    fn rebuild(&mut self, bits: u32) {
        self.root_bits = bits;
        let Some(root) = self.root.take() else {
            return;
        };
        let mut entries = Vec::with_capacity(self.len);
        Self::collect_dir(root, &mut entries);
        self.len = 0;
        let guard = ResetOnUnwind { tree: self };
        for (k, v) in entries {
            let r = self.insert_impl(k, v, false);
            debug_assert!(matches!(r, InsertResult::Inserted));
        }
        std::mem::forget(guard);
    }

    fn insert_impl(&mut self, key: K, value: V, replace: bool) -> InsertResult<K, V> {
        let tag = key.tiny();
        'restart: loop {
            if self.root.is_none() {
                self.root = Some(Directory::new(self.root_bits, 0));
            }
            let mut dir = NonNull::from(&mut **self.root.as_mut().unwrap());
            let mut offset = 0usize;
            let mut depth = 1usize;
            loop {
                let d = unsafe { dir.as_mut() };
                let slot = key.bits(offset, d.hash_len);
                let entry_off = offset + d.hash_len as usize;

                let step = match &d.children[slot as usize] {
                    ChildRef::Empty => Step::NewLeaf,
                    ChildRef::Dir(c) => {
                        let skip = c.prefix_len as usize;
                        if skip == 0 {
                            Step::Descend { skip }
                        } else {
                            // Compressed bits are not stored; recover them
                            // from any key under the subtree.
                            let (probe, _) = c.first_entry();
                            let matched = Self::matching_steps(&key, probe, entry_off, skip);
                            if matched == skip {
                                Step::Descend { skip }
                            } else {
                                let old_slot = probe.bits(entry_off + matched, STEP_BITS);
                                Step::Splice { matched, old_slot }
                            }
                        }
                    }
                    ChildRef::Leaf(l) => match l.find(tag, &key) {
                        Some(pos) => Step::LeafHit(pos),
                        None if l.has_room() => Step::LeafInsert,
                        None => {
                            let exhausted = if K::BOUNDED {
                                entry_off + STEP_BITS as usize > key.bit_len()
                            } else {
                                depth >= MAX_UNBOUNDED_DEPTH
                            };
                            if exhausted {
                                Step::Vectorize
                            } else {
                                Step::LeafSplit
                            }
                        }
                    },
                    ChildRef::Vector(vn) => match vn.find(&key) {
                        Some(pos) => Step::VecFound(pos),
                        None => Step::VecInsert,
                    },
                };

                match step {
                    Step::NewLeaf => {
                        d.install(slot, ChildRef::Leaf(LeafNode::boxed(tag, key, value)));
                        self.len += 1;
                        return InsertResult::Inserted;
                    }
                    Step::Descend { skip } => {
                        let c = match &mut d.children[slot as usize] {
                            ChildRef::Dir(c) => c,
                            _ => unreachable!(),
                        };
                        offset = entry_off + skip;
                        dir = NonNull::from(&mut **c);
                        depth += 1;
                    }
                    Step::Splice { matched, old_slot } => {
                        let mut old = match d.clear_slot(slot) {
                            ChildRef::Dir(c) => c,
                            _ => unreachable!(),
                        };
                        old.prefix_len -= matched as u32 + STEP_BITS;
                        let mut mid = Directory::new(STEP_BITS, matched as u32);
                        mid.install(old_slot, ChildRef::Dir(old));
                        d.install(slot, ChildRef::Dir(mid));
                        let c = match &mut d.children[slot as usize] {
                            ChildRef::Dir(c) => c,
                            _ => unreachable!(),
                        };
                        offset = entry_off + matched;
                        dir = NonNull::from(&mut **c);
                        depth += 1;
                    }
                    Step::LeafHit(pos) => {
                        if replace {
                            let l = match &mut d.children[slot as usize] {
                                ChildRef::Leaf(l) => l,
                                _ => unreachable!(),
                            };
                            return InsertResult::Replaced(l.replace_value(pos, value));
                        }
                        return InsertResult::Duplicate(key, value);
                    }
                    Step::LeafInsert => {
                        let l = match &mut d.children[slot as usize] {
                            ChildRef::Leaf(l) => l,
                            _ => unreachable!(),
                        };
                        l.insert(tag, key, value);
                        self.len += 1;
                        return InsertResult::Inserted;
                    }
                    Step::LeafSplit => {
                        // The bucket is detached while user key code runs in
                        // `split_leaf`; a panic there must not leave the tree
                        // undercounting, so the full-reset policy applies.
                        let guard = ResetOnUnwind { tree: self };
                        let leaf = match d.clear_slot(slot) {
                            ChildRef::Leaf(l) => l,
                            _ => unreachable!(),
                        };
                        let nd = Self::split_leaf(leaf.into_entries(), entry_off);
                        d.install(slot, ChildRef::Dir(nd));
                        unsafe { self.merge_up(dir) };
                        std::mem::forget(guard);
                        continue 'restart;
                    }
                    Step::Vectorize => {
                        let guard = ResetOnUnwind { tree: self };
                        let leaf = match d.clear_slot(slot) {
                            ChildRef::Leaf(l) => l,
                            _ => unreachable!(),
                        };
                        let mut vn = VectorNode::from_entries(leaf.into_entries());
                        vn.insert(key, value);
                        d.install(slot, ChildRef::Vector(vn));
                        std::mem::forget(guard);
                        self.len += 1;
                        return InsertResult::Inserted;
                    }
                    Step::VecFound(pos) => {
                        if replace {
                            let vn = match &mut d.children[slot as usize] {
                                ChildRef::Vector(vn) => vn,
                                _ => unreachable!(),
                            };
                            return InsertResult::Replaced(vn.replace_value(pos, value));
                        }
                        return InsertResult::Duplicate(key, value);
                    }
                    Step::VecInsert => {
                        let vn = match &mut d.children[slot as usize] {
                            ChildRef::Vector(vn) => vn,
                            _ => unreachable!(),
                        };
                        vn.insert(key, value);
                        self.len += 1;
                        return InsertResult::Inserted;
                    }
                }
            }
        }
    }

    /// Number of whole split-step windows on which `a` and `b` agree,
    /// starting at `offset`, capped at `limit` bits.
    fn matching_steps(a: &K, b: &K, offset: usize, limit: usize) -> usize {
        let mut m = 0;
        while m < limit && a.bits(offset + m, STEP_BITS) == b.bits(offset + m, STEP_BITS) {
            m += STEP_BITS as usize;
        }
        m
    }

    /// Redistribute a full bucket's entries into a fresh two-bit directory
    /// whose window starts past any bits the entries all share.
    fn split_leaf(entries: Vec<(K, V)>, entry_off: usize) -> Box<Directory<K, V>> {
        debug_assert!(!entries.is_empty());
        let budget = if K::BOUNDED {
            let bl = entries[0].0.bit_len();
            let room = bl.saturating_sub(entry_off + STEP_BITS as usize);
            room - room % STEP_BITS as usize
        } else {
            MAX_PREFIX_BITS
        };
        let mut pfx = 0usize;
        'scan: while pfx < budget {
            let w = entries[0].0.bits(entry_off + pfx, STEP_BITS);
            for (k, _) in &entries[1..] {
                if k.bits(entry_off + pfx, STEP_BITS) != w {
                    break 'scan;
                }
            }
            pfx += STEP_BITS as usize;
        }

        let mut nd = Directory::new(STEP_BITS, pfx as u32);
        let window = entry_off + pfx;
        for (k, v) in entries {
            let slot = k.bits(window, STEP_BITS);
            let tag = k.tiny();
            match &mut nd.children[slot as usize] {
                ChildRef::Empty => {
                    nd.install(slot, ChildRef::Leaf(LeafNode::boxed(tag, k, v)));
                }
                ChildRef::Leaf(l) => l.insert(tag, k, v),
                _ => unreachable!(),
            }
        }
        nd
    }

    /// While every slot of `dir` holds a sub-directory, flatten them all into
    /// one table [`STEP_BITS`] wider, then re-examine the result.
    unsafe fn merge_up(&mut self, mut dir: NonNull<Directory<K, V>>) {
        let guard = ResetOnUnwind { tree: self };
        loop {
            let (full, dir_off, parent, pslot) = {
                let d = dir.as_ref();
                (
                    d.dir_count == d.size() && d.hash_len + STEP_BITS <= MAX_DIR_BITS,
                    d.bit_offset(),
                    d.parent,
                    d.parent_slot,
                )
            };
            if !full {
                break;
            }
            let owned = match parent {
                Some(mut p) => match p.as_mut().clear_slot(pslot) {
                    ChildRef::Dir(b) => b,
                    _ => unreachable!(),
                },
                None => self.root.take().expect("merging the root"),
            };
            let merged = Self::merge_directory(owned, dir_off);
            match parent {
                Some(mut p) => {
                    p.as_mut().install(pslot, ChildRef::Dir(merged));
                    dir = match &mut p.as_mut().children[pslot as usize] {
                        ChildRef::Dir(b) => NonNull::from(&mut **b),
                        _ => unreachable!(),
                    };
                }
                None => {
                    self.root = Some(merged);
                    dir = NonNull::from(&mut **self.root.as_mut().unwrap());
                }
            }
        }
        std::mem::forget(guard);
    }

    /// Flatten a directory whose every slot is a sub-directory into one
    /// table [`STEP_BITS`] wider. `dir_off` is the bit offset of `d`'s
    /// window.
    fn merge_directory(d: Box<Directory<K, V>>, dir_off: usize) -> Box<Directory<K, V>> {
        let d = *d;
        let child_off = dir_off + d.hash_len as usize;
        let mut nd = Directory::new(d.hash_len + STEP_BITS, d.prefix_len);

        for (s, child) in d.children.into_vec().into_iter().enumerate() {
            let s = s as u32;
            let mut c = match child {
                ChildRef::Dir(c) => c,
                _ => unreachable!("merge requires a full table of directories"),
            };
            if c.prefix_len > 0 {
                // The first step of the child's skipped prefix becomes part
                // of the widened window.
                let sub = {
                    let (probe, _) = c.first_entry();
                    probe.bits(child_off, STEP_BITS)
                };
                c.prefix_len -= STEP_BITS;
                nd.install((s << STEP_BITS) | sub, ChildRef::Dir(c));
            } else if c.hash_len == STEP_BITS {
                // The child's whole window folds into the new table; its
                // children move up a level.
                for (j, g) in c.children.into_vec().into_iter().enumerate() {
                    if !g.is_empty() {
                        nd.install((s << STEP_BITS) | j as u32, g);
                    }
                }
            } else {
                // The child is wider than one step: its top step joins the
                // new window and the rest regroups under fresh
                // sub-directories.
                let gbits = c.hash_len - STEP_BITS;
                let gsize = 1u32 << gbits;
                let mut sub: Option<Box<Directory<K, V>>> = None;
                let mut top = 0u32;
                for (j, g) in c.children.into_vec().into_iter().enumerate() {
                    let j = j as u32;
                    if j % gsize == 0 {
                        if let Some(prev) = sub.take() {
                            nd.install((s << STEP_BITS) | top, ChildRef::Dir(prev));
                        }
                        top = j >> gbits;
                    }
                    if !g.is_empty() {
                        sub.get_or_insert_with(|| Directory::new(gbits, 0))
                            .install(j % gsize, g);
                    }
                }
                if let Some(prev) = sub.take() {
                    nd.install((s << STEP_BITS) | top, ChildRef::Dir(prev));
                }
            }
        }
        nd
    }

    /// Clear the emptied slot and free any ancestor directories this leaves
    /// childless, bottom up. The root survives even when empty. Returns the
    /// deepest directory that kept children (or the root).
    unsafe fn prune(mut dir: NonNull<Directory<K, V>>, slot: u32) -> NonNull<Directory<K, V>> {
        let mut slot = slot;
        loop {
            let d = dir.as_mut();
            drop(d.clear_slot(slot));
            if d.child_count > 0 {
                return dir;
            }
            match d.parent {
                Some(p) => {
                    slot = d.parent_slot;
                    dir = p;
                }
                None => return dir,
            }
        }
    }

    /// Detach the target subtree and put every entry back through ordinary
    /// insertion. Deliberately O(subtree): erase is assumed rare next to
    /// lookup, and full reinsertion re-establishes the density the split and
    /// merge rules aim for.
    fn rebalance(&mut self, target: NonNull<Directory<K, V>>) {
        let subtree = unsafe {
            let (parent, pslot) = {
                let t = target.as_ref();
                (t.parent, t.parent_slot)
            };
            match parent {
                None => self.root.take().expect("rebalance target is the root"),
                Some(mut p) => {
                    let child = match p.as_mut().clear_slot(pslot) {
                        ChildRef::Dir(b) => b,
                        _ => unreachable!(),
                    };
                    // Detaching may leave empty ancestors behind.
                    let mut cur = p;
                    loop {
                        let (cc, par, ps) = {
                            let c = cur.as_ref();
                            (c.child_count, c.parent, c.parent_slot)
                        };
                        if cc > 0 {
                            break;
                        }
                        let Some(mut pp) = par else {
                            break;
                        };
                        drop(pp.as_mut().clear_slot(ps));
                        cur = pp;
                    }
                    child
                }
            }
        };
        let mut entries = Vec::new();
        Self::collect_dir(subtree, &mut entries);
        self.len -= entries.len();
        let guard = ResetOnUnwind { tree: self };
        for (k, v) in entries {
            let r = self.insert_impl(k, v, false);
            debug_assert!(matches!(r, InsertResult::Inserted));
        }
        std::mem::forget(guard);
    }

    fn collect_dir(d: Box<Directory<K, V>>, out: &mut Vec<(K, V)>) {
        let d = *d;
        for child in d.children.into_vec() {
            match child {
                ChildRef::Empty => {}
                ChildRef::Dir(c) => Self::collect_dir(c, out),
                ChildRef::Leaf(l) => out.extend(l.into_entries()),
                ChildRef::Vector(vn) => out.extend(vn.into_entries()),
            }
        }
    }

    /// Position a cursor on the first entry >= `key` (> with `strict`).
    fn seek_cursor(&self, key: &K, strict: bool) -> Option<Cursor<K, V>>
    where
        K: OrderedKey,
    {
        let mut dir: &Directory<K, V> = self.root.as_deref()?;
        let mut offset = 0usize;
        loop {
            let slot = key.bits(offset, dir.hash_len);
            let entry_off = offset + dir.hash_len as usize;
            match &dir.children[slot as usize] {
                ChildRef::Empty => {
                    return unsafe { Cursor::seek_forward(NonNull::from(dir), slot + 1) };
                }
                ChildRef::Dir(c) => {
                    let skip = c.prefix_len as usize;
                    if skip > 0 {
                        let (probe, _) = c.first_entry();
                        let matched = Self::matching_steps(key, probe, entry_off, skip);
                        if matched < skip {
                            // Diverged inside the skipped run: the whole
                            // subtree sits on one side of the key.
                            let kw = key.bits(entry_off + matched, STEP_BITS);
                            let pw = probe.bits(entry_off + matched, STEP_BITS);
                            return if kw < pw {
                                unsafe { Cursor::seek_forward(NonNull::from(&**c), 0) }
                            } else {
                                unsafe { Cursor::seek_forward(NonNull::from(dir), slot + 1) }
                            };
                        }
                    }
                    offset = entry_off + skip;
                    dir = c;
                }
                ChildRef::Leaf(l) => {
                    let pos = l.seek(key, strict);
                    if pos < l.len() {
                        return Some(Cursor::at(dir, slot, pos));
                    }
                    return unsafe { Cursor::seek_forward(NonNull::from(dir), slot + 1) };
                }
                ChildRef::Vector(vn) => {
                    let pos = vn.seek(key, strict);
                    if pos < vn.len() {
                        return Some(Cursor::at(dir, slot, pos));
                    }
                    return unsafe { Cursor::seek_forward(NonNull::from(dir), slot + 1) };
                }
            }
        }
    }
}

impl<'a, K: KeyHash, V> IntoIterator for &'a VartTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
