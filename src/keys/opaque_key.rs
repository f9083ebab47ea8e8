use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash};

use crate::keys::KeyHash;

/// A hash-table-mode key: a user value paired with its 64-bit hash.
///
/// The trie consumes the hash bits; equality and lookup delegate to the
/// wrapped value. `ORDERED` is false, so the sorted-mode surface
/// (`lower_bound`, `range`, prefix queries) does not compile against opaque
/// keys, and iteration order is unspecified.
#[derive(Clone, Debug)]
pub struct OpaqueKey<T> {
    value: T,
    hash: u64,
}

impl<T: Hash> OpaqueKey<T> {
    pub fn new<S: BuildHasher>(value: T, build_hasher: &S) -> Self {
        let hash = build_hasher.hash_one(&value);
        Self { value, hash }
    }
}

impl<T> OpaqueKey<T> {
    /// Wrap a value with a precomputed hash. Callers must hash equal values
    /// identically or lookups will miss.
    pub fn with_hash(value: T, hash: u64) -> Self {
        Self { value, hash }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: PartialEq> PartialEq for OpaqueKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.value == other.value
    }
}

impl<T: Eq> Eq for OpaqueKey<T> {}

impl<T: Clone + Eq> KeyHash for OpaqueKey<T> {
    const ORDERED: bool = false;
    const BOUNDED: bool = true;

    #[inline]
    fn bit_len(&self) -> usize {
        64
    }

    #[inline]
    fn bits(&self, offset: usize, count: u32) -> u32 {
        debug_assert!(count >= 1 && count <= 32);
        if offset >= 64 {
            return 0;
        }
        ((self.hash << offset) >> (64 - count)) as u32
    }

    #[inline]
    fn tiny(&self) -> u8 {
        (self.hash >> 56) as u8
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        // Arbitrary but consistent; never surfaced to callers.
        self.hash.cmp(&other.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::OpaqueKey;
    use crate::keys::KeyHash;
    use std::collections::hash_map::RandomState;

    #[test]
    fn test_equal_values_hash_equal() {
        let s = RandomState::new();
        let a = OpaqueKey::new("hello".to_string(), &s);
        let b = OpaqueKey::new("hello".to_string(), &s);
        assert_eq!(a, b);
        assert_eq!(a.tiny(), b.tiny());
        assert_eq!(a.bits(0, 32), b.bits(0, 32));
    }

    #[test]
    fn test_colliding_hashes_still_distinct() {
        let a = OpaqueKey::with_hash(1u32, 0xdead_beef);
        let b = OpaqueKey::with_hash(2u32, 0xdead_beef);
        assert_ne!(a, b);
        assert_eq!(a.bits(0, 32), b.bits(0, 32));
        assert_eq!(a.tiny(), b.tiny());
    }

    #[test]
    fn test_bits_exhaust_at_64() {
        let k = OpaqueKey::with_hash((), u64::MAX);
        assert_eq!(k.bit_len(), 64);
        assert_eq!(k.bits(62, 2), 0b11);
        assert_eq!(k.bits(64, 8), 0);
    }
}
