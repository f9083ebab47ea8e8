use std::cmp::Ordering;

use num_traits::ToBytes;

use crate::keys::{KeyHash, OrderedKey, PrefixKey};
use crate::utils::bit_window::read_bits;

/// An owned byte-sequence key: strings, paths, serialized tuples.
///
/// Bit windows past the end of the data read as zero, so keys of different
/// lengths coexist in one trie without a terminator byte. Two distinct keys
/// can therefore share every window a directory ever looks at (`"a"` vs
/// `"a\0"`); the depth cap resolves such pairs into a vector bucket where
/// full equality takes over.
///
/// ```rust
/// use vart::keys::bytes_key::BytesKey;
///
/// let k: BytesKey = "hello".into();
/// assert!(k.as_bytes().starts_with(b"hel"));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BytesKey {
    data: Box<[u8]>,
}

impl BytesKey {
    pub fn new(data: impl Into<Box<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    /// Build from a slice of wider unsigned elements, normalizing each to
    /// big-endian so byte order matches element order.
    pub fn from_wide<T: ToBytes>(elements: &[T]) -> Self {
        let mut data = Vec::with_capacity(elements.len() * std::mem::size_of::<T>());
        for e in elements {
            data.extend_from_slice(e.to_be_bytes().as_ref());
        }
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<&str> for BytesKey {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for BytesKey {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&[u8]> for BytesKey {
    fn from(b: &[u8]) -> Self {
        Self::new(b)
    }
}

impl From<Vec<u8>> for BytesKey {
    fn from(b: Vec<u8>) -> Self {
        Self::new(b)
    }
}

impl KeyHash for BytesKey {
    const ORDERED: bool = true;
    const BOUNDED: bool = false;

    #[inline]
    fn bit_len(&self) -> usize {
        self.data.len() * 8
    }

    #[inline]
    fn bits(&self, offset: usize, count: u32) -> u32 {
        read_bits(&self.data, offset, count)
    }

    fn tiny(&self) -> u8 {
        // FNV-1a fold down to one byte.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
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

impl OrderedKey for BytesKey {}

impl PrefixKey for BytesKey {
    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data.starts_with(prefix)
    }

    fn from_prefix(prefix: &[u8]) -> Self {
        Self::new(prefix)
    }
}
