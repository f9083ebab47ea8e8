//! Resumable cursors and tree iteration.
//!
//! A cursor is a (directory, slot, bucket position) triple. Moving it scans
//! the current table from the cursor slot, descends into the first or last
//! occupied slot of sub-directories, and pops to `parent_slot ± 1` through
//! the parent back-reference, so no path stack is kept. The public [`Iter`]
//! borrows the tree, which is what makes mutation during iteration a borrow
//! error rather than a runtime hazard.

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::keys::{KeyHash, PrefixKey};
use crate::node::{ChildRef, Directory};

pub(crate) struct Cursor<K: KeyHash, V> {
    dir: NonNull<Directory<K, V>>,
    slot: u32,
    pos: usize,
}

impl<K: KeyHash, V> Clone for Cursor<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: KeyHash, V> Copy for Cursor<K, V> {}

impl<K: KeyHash, V> PartialEq for Cursor<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.dir == other.dir && self.slot == other.slot && self.pos == other.pos
    }
}

impl<K: KeyHash, V> Cursor<K, V> {
    pub(crate) fn at(dir: &Directory<K, V>, slot: u32, pos: usize) -> Self {
        Self {
            dir: NonNull::from(dir),
            slot,
            pos,
        }
    }

    /// First entry at or after `from` in `dir`, searching upward through the
    /// parent chain when `dir` is exhausted.
    ///
    /// Callers guarantee the tree outlives the returned cursor and is not
    /// mutated while it is alive.
    pub(crate) unsafe fn seek_forward(mut dir: NonNull<Directory<K, V>>, mut from: u32) -> Option<Self> {
        loop {
            let d = dir.as_ref();
            match d.next_occupied(from) {
                Some(slot) => match &d.children[slot as usize] {
                    ChildRef::Dir(c) => {
                        dir = NonNull::from(&**c);
                        from = 0;
                    }
                    _ => return Some(Cursor { dir, slot, pos: 0 }),
                },
                None => {
                    from = d.parent_slot + 1;
                    dir = d.parent?;
                }
            }
        }
    }

    /// Mirror of [`seek_forward`](Self::seek_forward): last entry at or
    /// before `upto` (negative means "none at this level").
    pub(crate) unsafe fn seek_backward(mut dir: NonNull<Directory<K, V>>, mut upto: i64) -> Option<Self> {
        loop {
            let d = dir.as_ref();
            let found = if upto < 0 {
                None
            } else {
                d.prev_occupied(upto.min(d.size() as i64 - 1) as u32)
            };
            match found {
                Some(slot) => match &d.children[slot as usize] {
                    ChildRef::Dir(c) => {
                        dir = NonNull::from(&**c);
                        upto = i64::MAX;
                    }
                    bucket => {
                        return Some(Cursor {
                            dir,
                            slot,
                            pos: bucket.bucket_len() - 1,
                        })
                    }
                },
                None => {
                    upto = d.parent_slot as i64 - 1;
                    dir = d.parent?;
                }
            }
        }
    }

    pub(crate) unsafe fn advance(self) -> Option<Self> {
        let d = self.dir.as_ref();
        if self.pos + 1 < d.children[self.slot as usize].bucket_len() {
            return Some(Cursor {
                pos: self.pos + 1,
                ..self
            });
        }
        Self::seek_forward(self.dir, self.slot + 1)
    }

    pub(crate) unsafe fn retreat(self) -> Option<Self> {
        if self.pos > 0 {
            return Some(Cursor {
                pos: self.pos - 1,
                ..self
            });
        }
        Self::seek_backward(self.dir, self.slot as i64 - 1)
    }

    /// The entry under the cursor. The caller picks the lifetime; it must
    /// not outlive the tree borrow the cursor was derived from.
    pub(crate) unsafe fn entry<'t>(&self) -> (&'t K, &'t V) {
        let d: &'t Directory<K, V> = &*self.dir.as_ptr();
        d.children[self.slot as usize].bucket_entry(self.pos)
    }
}

/// Double-ended iterator over a tree's entries. Sorted keys come out in
/// ascending key order; opaque keys in an unspecified but stable order.
pub struct Iter<'a, K: KeyHash, V> {
    front: Option<Cursor<K, V>>,
    back: Option<Cursor<K, V>>,
    done: bool,
    _tree: PhantomData<&'a Directory<K, V>>,
}

impl<'a, K: KeyHash, V> Iter<'a, K, V> {
    pub(crate) fn empty() -> Self {
        Iter {
            front: None,
            back: None,
            done: true,
            _tree: PhantomData,
        }
    }

    pub(crate) fn new(root: &'a Directory<K, V>) -> Self {
        let front = unsafe { Cursor::seek_forward(NonNull::from(root), 0) };
        Self::with_front(front, root)
    }

    /// Iterate from a precomputed start position to the end of the tree.
    pub(crate) fn with_front(front: Option<Cursor<K, V>>, root: &'a Directory<K, V>) -> Self {
        if front.is_none() {
            return Self::empty();
        }
        let back = unsafe { Cursor::seek_backward(NonNull::from(root), i64::MAX) };
        Iter {
            front,
            back,
            done: back.is_none(),
            _tree: PhantomData,
        }
    }

    fn halt(&mut self) {
        self.done = true;
    }
}

impl<'a, K: KeyHash, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cur = self.front?;
        let out = unsafe { cur.entry() };
        if self.back == Some(cur) {
            self.halt();
        } else {
            self.front = unsafe { cur.advance() };
            if self.front.is_none() {
                self.halt();
            }
        }
        Some(out)
    }
}

impl<'a, K: KeyHash, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cur = self.back?;
        let out = unsafe { cur.entry() };
        if self.front == Some(cur) {
            self.halt();
        } else {
            self.back = unsafe { cur.retreat() };
            if self.back.is_none() {
                self.halt();
            }
        }
        Some(out)
    }
}

/// Iterator over the entries whose keys share a byte prefix. Stops
/// permanently at the first key past the prefix block.
pub struct PrefixIter<'a, K: PrefixKey, V> {
    inner: Iter<'a, K, V>,
    prefix: Box<[u8]>,
}

impl<'a, K: PrefixKey, V> PrefixIter<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>, prefix: Box<[u8]>) -> Self {
        Self { inner, prefix }
    }
}

impl<'a, K: PrefixKey, V> Iterator for PrefixIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next()?;
        if k.starts_with(&self.prefix) {
            Some((k, v))
        } else {
            self.inner.halt();
            None
        }
    }
}
