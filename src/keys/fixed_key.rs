use std::cmp::Ordering;

use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::keys::{KeyHash, OrderedKey};

/// A fixed-width key of up to 64 canonical bits.
///
/// The canonical form is an unsigned bit pattern whose MSB-first order equals
/// the numeric order of the source value: unsigned integers are taken as-is,
/// signed integers get their sign bit flipped, and floats go through the
/// total-order transform. Wider keys (128-bit integers, tuples) are built with
/// [`CompositeKey`](crate::keys::composite_key::CompositeKey) instead.
///
/// ## Examples
///
/// ```rust
/// use vart::keys::{fixed_key::FixedKey, KeyHash};
///
/// let a: FixedKey = (-5i32).into();
/// let b: FixedKey = 3i32.into();
/// assert!(a < b);
///
/// // The first 4 bits of a u8 key are its high nibble.
/// let k: FixedKey = 0xABu8.into();
/// assert_eq!(k.bits(0, 4), 0xA);
/// assert_eq!(k.bits(4, 4), 0xB);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FixedKey {
    // Canonical bits, left-aligned: bit 0 of the key is the MSB of `bits`.
    bits: u64,
    width: u8,
}

impl FixedKey {
    /// Build a key from any unsigned integer of at most 64 bits.
    pub fn from_unsigned<T>(value: T) -> Self
    where
        T: PrimInt + Unsigned + AsPrimitive<u64>,
    {
        let width = (std::mem::size_of::<T>() * 8) as u8;
        debug_assert!(width <= 64, "wider keys belong in CompositeKey");
        Self::from_raw(value.as_(), width)
    }

    /// Build a key from pre-canonicalized bits held in the low `width` bits
    /// of `value`.
    pub fn from_raw(value: u64, width: u8) -> Self {
        debug_assert!(width >= 1 && width <= 64);
        let shift = 64 - width as u32;
        Self {
            bits: value << shift,
            width,
        }
    }

    /// The canonical bit pattern, left-aligned to the MSB.
    pub(crate) fn canonical_bits(&self) -> u64 {
        self.bits
    }

    pub(crate) fn width(&self) -> u32 {
        self.width as u32
    }
}

impl KeyHash for FixedKey {
    const ORDERED: bool = true;
    const BOUNDED: bool = true;

    #[inline(always)]
    fn bit_len(&self) -> usize {
        self.width as usize
    }

    #[inline(always)]
    fn bits(&self, offset: usize, count: u32) -> u32 {
        debug_assert!(count >= 1 && count <= 32);
        if offset >= 64 {
            return 0;
        }
        ((self.bits << offset) >> (64 - count)) as u32
    }

    #[inline]
    fn tiny(&self) -> u8 {
        // Fibonacci multiplicative fold; only probe quality matters here.
        (self.bits.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 56) as u8
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl OrderedKey for FixedKey {}

macro_rules! impl_from_unsigned {
    ( $($t:ty),* ) => {
    $(
    impl From<$t> for FixedKey {
        fn from(value: $t) -> Self {
            FixedKey::from_unsigned(value)
        }
    }
    impl From<&$t> for FixedKey {
        fn from(value: &$t) -> Self {
            (*value).into()
        }
    }
    )*
    }
}
impl_from_unsigned!(u8, u16, u32, u64, usize);

macro_rules! impl_from_signed {
    ( $t:ty, $tu:ty ) => {
        impl From<$t> for FixedKey {
            fn from(value: $t) -> Self {
                // Flip the sign bit so negatives map below positives in
                // unsigned order.
                let flipped = (value as $tu) ^ (1 << (<$tu>::BITS - 1));
                FixedKey::from_unsigned(flipped)
            }
        }
        impl From<&$t> for FixedKey {
            fn from(value: &$t) -> Self {
                (*value).into()
            }
        }
    };
}
impl_from_signed!(i8, u8);
impl_from_signed!(i16, u16);
impl_from_signed!(i32, u32);
impl_from_signed!(i64, u64);
impl_from_signed!(isize, usize);

impl From<f32> for FixedKey {
    fn from(value: f32) -> Self {
        // IEEE total-order transform: flip everything for negatives, flip
        // just the sign for non-negatives.
        let b = value.to_bits();
        let canonical = if b & 0x8000_0000 != 0 { !b } else { b ^ 0x8000_0000 };
        FixedKey::from_unsigned(canonical)
    }
}

impl From<f64> for FixedKey {
    fn from(value: f64) -> Self {
        let b = value.to_bits();
        let canonical = if b & (1 << 63) != 0 { !b } else { b ^ (1 << 63) };
        FixedKey::from_unsigned(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::FixedKey;
    use crate::keys::KeyHash;

    #[test]
    fn test_unsigned_order_matches_bit_order() {
        let keys: Vec<FixedKey> = [0u64, 1, 255, 256, 1 << 40, u64::MAX]
            .iter()
            .map(|v| (*v).into())
            .collect();
        for w in keys.windows(2) {
            assert!(w[0] < w[1]);
            assert!(w[0].bits(0, 32) <= w[1].bits(0, 32));
        }
    }

    #[test]
    fn test_signed_order_preserved() {
        let keys: Vec<FixedKey> = [i32::MIN, -70000, -1, 0, 1, 70000, i32::MAX]
            .iter()
            .map(|v| (*v).into())
            .collect();
        for w in keys.windows(2) {
            assert!(w[0] < w[1], "{:?} !< {:?}", w[0], w[1]);
        }
    }

    #[test]
    fn test_float_order_preserved() {
        let keys: Vec<FixedKey> = [f64::NEG_INFINITY, -1.5, -0.0, 0.0, 1e-10, 2.0, f64::INFINITY]
            .iter()
            .map(|v| (*v).into())
            .collect();
        for w in keys.windows(2) {
            assert!(w[0] <= w[1]);
        }
        // -0.0 and +0.0 differ in the total order but stay adjacent.
        assert!(keys[2] < keys[3]);
    }

    #[test]
    fn test_bit_windows() {
        let k: FixedKey = 0xDEAD_BEEFu32.into();
        assert_eq!(k.bit_len(), 32);
        assert_eq!(k.bits(0, 16), 0xDEAD);
        assert_eq!(k.bits(16, 16), 0xBEEF);
        assert_eq!(k.bits(28, 4), 0xF);
        // Past the budget everything reads zero.
        assert_eq!(k.bits(32, 16), 0);
        assert_eq!(k.bits(64, 32), 0);
    }

    #[test]
    fn test_narrow_key_budget() {
        let k: FixedKey = 0x5Au8.into();
        assert_eq!(k.bit_len(), 8);
        assert_eq!(k.bits(0, 8), 0x5A);
        assert_eq!(k.bits(8, 8), 0);
    }
}
