use std::cmp::Ordering;

use crate::keys::fixed_key::FixedKey;
use crate::keys::{KeyHash, OrderedKey};
use crate::utils::bit_window::read_bits;

/// A key built by concatenating sub-keys bit-wise.
///
/// Components are pushed in significance order; the resulting bit string
/// sorts lexicographically, which for fixed-width components equals tuple
/// order. The builder packs at the bit level, so a `(u8, bool)` pair costs
/// nine bits, not two bytes.
///
/// ```rust
/// use vart::keys::composite_key::CompositeKey;
///
/// let mut k = CompositeKey::new();
/// k.push_fixed(7u16.into());
/// k.push_bytes(b"x");
/// assert_eq!(k.bit_count(), 24);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct CompositeKey {
    data: Vec<u8>,
    bit_len: usize,
}

impl CompositeKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, MSB-first.
    pub fn append_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64);
        let mut left = count;
        while left > 0 {
            let used = (self.bit_len % 8) as u32;
            if used == 0 {
                self.data.push(0);
            }
            let room = 8 - used;
            let take = left.min(room);
            let chunk = ((value >> (left - take)) & ((1u64 << take) - 1)) as u8;
            let last = self.data.len() - 1;
            self.data[last] |= chunk << (room - take);
            self.bit_len += take as usize;
            left -= take;
        }
    }

    /// Append a fixed-width component.
    pub fn push_fixed(&mut self, key: FixedKey) {
        let width = key.width();
        self.append_bits(key.canonical_bits() >> (64 - width), width);
    }

    /// Append a byte-sequence component. Mixing variable-length components
    /// anywhere but last breaks lexicographic tuple order; callers own that
    /// choice.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.append_bits(*b as u64, 8);
        }
    }

    pub fn bit_count(&self) -> usize {
        self.bit_len
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Trailing bits in the last byte are zero, so byte order is bit
        // order; length breaks ties.
        self.data
            .cmp(&other.data)
            .then(self.bit_len.cmp(&other.bit_len))
    }
}

impl KeyHash for CompositeKey {
    const ORDERED: bool = true;
    const BOUNDED: bool = false;

    #[inline]
    fn bit_len(&self) -> usize {
        self.bit_len
    }

    #[inline]
    fn bits(&self, offset: usize, count: u32) -> u32 {
        read_bits(&self.data, offset, count)
    }

    fn tiny(&self) -> u8 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ self.bit_len as u64;
        for b in self.data.iter() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x1000_0000_01b3);
        }
        (h ^ (h >> 32)) as u8
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl OrderedKey for CompositeKey {}

#[cfg(test)]
mod tests {
    use super::CompositeKey;
    use crate::keys::KeyHash;

    fn pair(a: u16, b: u8) -> CompositeKey {
        let mut k = CompositeKey::new();
        k.push_fixed(a.into());
        k.push_fixed(b.into());
        k
    }

    #[test]
    fn test_tuple_order() {
        assert!(pair(1, 200) < pair(2, 0));
        assert!(pair(5, 3) < pair(5, 4));
        assert_eq!(pair(5, 3), pair(5, 3));
    }

    #[test]
    fn test_unaligned_packing() {
        let mut k = CompositeKey::new();
        k.append_bits(0b101, 3);
        k.append_bits(0b11_0011, 6);
        assert_eq!(k.bit_count(), 9);
        assert_eq!(k.bits(0, 3), 0b101);
        assert_eq!(k.bits(3, 6), 0b11_0011);
        assert_eq!(k.bits(9, 8), 0);
    }

    #[test]
    fn test_push_bytes_matches_bytes() {
        let mut k = CompositeKey::new();
        k.push_bytes(b"hi");
        assert_eq!(k.bit_count(), 16);
        assert_eq!(k.bits(0, 16), u32::from(u16::from_be_bytes(*b"hi")));
    }

    #[test]
    fn test_shorter_prefix_sorts_first() {
        let mut a = CompositeKey::new();
        a.push_bytes(b"ab");
        let mut b = CompositeKey::new();
        b.push_bytes(b"abc");
        assert!(a < b);
    }
}
