//! `RangeBounds`-driven iteration over sorted trees.

use std::cmp::Ordering;
use std::ops::Bound;

use crate::iter::Iter;
use crate::keys::{KeyHash, OrderedKey};

/// Entries within a key range, ascending. The start bound positions the
/// underlying iterator; the end bound is checked as entries come out.
pub struct Range<'a, K: OrderedKey, V> {
    iter: Iter<'a, K, V>,
    end: Bound<K>,
}

impl<'a, K: OrderedKey, V> Range<'a, K, V> {
    pub(crate) fn new(iter: Iter<'a, K, V>, end: Bound<K>) -> Self {
        Self { iter, end }
    }
}

impl<'a, K: OrderedKey, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.iter.next()?;
        let inside = match &self.end {
            Bound::Unbounded => true,
            Bound::Included(end) => k.compare(end) != Ordering::Greater,
            Bound::Excluded(end) => k.compare(end) == Ordering::Less,
        };
        if inside {
            Some((k, v))
        } else {
            None
        }
    }
}
