//! Key hashing: the canonical, bit-addressable form of a domain key.
//!
//! Every key stored in a [`VartTree`](crate::tree::VartTree) is viewed
//! through [`KeyHash`]: a sequence of bits from which directories carve
//! fixed-width slot-selection windows, plus a one-byte digest used to probe
//! bucket nodes. Four variants cover the supported key domains:
//!
//! - [`fixed_key::FixedKey`] for integers, floats and other fixed-width
//!   values, reinterpreted so unsigned bit order matches numeric order;
//! - [`bytes_key::BytesKey`] for byte and character sequences, with prefix
//!   query support;
//! - [`composite_key::CompositeKey`] for tuples of sub-keys concatenated
//!   bit-wise;
//! - [`opaque_key::OpaqueKey`] for hash-table mode, wrapping a user-supplied
//!   hash result and equality.

use std::cmp::Ordering;

pub mod bytes_key;
pub mod composite_key;
pub mod fixed_key;
pub mod opaque_key;

pub trait KeyHash: Clone + Eq {
    /// Whether bitwise window order equals the domain order of the key.
    /// Sorted-mode behavior (ordered buckets, bound/prefix queries) is only
    /// available when this is true.
    const ORDERED: bool;

    /// Whether the key has a finite bit budget. Bounded keys convert
    /// overflowing buckets to vector nodes once their bits are exhausted;
    /// unbounded keys rely on the trie depth cap instead.
    const BOUNDED: bool;

    /// Total number of addressable bits in this key.
    fn bit_len(&self) -> usize;

    /// Up to 32 bits starting at `offset`, MSB-first, zero-padded past
    /// [`bit_len`](Self::bit_len).
    fn bits(&self, offset: usize, count: u32) -> u32;

    /// One-byte digest stored next to each bucket value to accelerate
    /// membership probes.
    fn tiny(&self) -> u8;

    /// Total order used to keep sorted buckets sorted. Must agree with `Ord`
    /// for ordered keys; for opaque keys it is an arbitrary but consistent
    /// order that is never exposed.
    fn compare(&self, other: &Self) -> Ordering;
}

/// Keys whose bit order is their domain order. Gates every sorted-mode
/// operation (`lower_bound`, `upper_bound`, `range`, `reserve`,
/// `shrink_to_fit`) at compile time.
pub trait OrderedKey: KeyHash + Ord {}

/// Ordered keys that are byte sequences and therefore support prefix queries.
pub trait PrefixKey: OrderedKey {
    /// Whether this key begins with the given byte prefix.
    fn starts_with(&self, prefix: &[u8]) -> bool;

    /// The smallest key with the given byte prefix, used to seed a prefix
    /// scan.
    fn from_prefix(prefix: &[u8]) -> Self;
}
