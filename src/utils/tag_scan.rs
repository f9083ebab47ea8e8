//! Tiny-hash tag probing for bucket nodes.
//!
//! A bucket keeps a contiguous one-byte tag per value; membership probes scan
//! the tag array first and only fall through to full-key comparison on a tag
//! hit. The scan returns a bitmask of candidate positions so callers can walk
//! multiple hits cheaply. SIMD is an acceleration, not a requirement: the
//! scalar scan is the canonical behavior.

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
#[inline]
fn x86_64_sse_tag_mask(tags: &[u8], tag: u8) -> u32 {
    use std::arch::x86_64::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };

    debug_assert!(tags.len() <= 16);
    // The tag array can be shorter than a full vector; stage it so the load
    // stays in bounds, then mask the lanes past the end.
    let mut buf = [0u8; 16];
    buf[..tags.len()].copy_from_slice(tags);

    let bitfield = unsafe {
        let tag_vec = _mm_set1_epi8(tag as i8);
        let results = _mm_cmpeq_epi8(tag_vec, _mm_loadu_si128(buf.as_ptr() as *const __m128i));
        _mm_movemask_epi8(results) as u32
    };
    bitfield & ((1u32 << tags.len()) - 1)
}

#[inline]
fn scalar_tag_mask(tags: &[u8], tag: u8) -> u32 {
    let mut mask = 0u32;
    for (i, t) in tags.iter().enumerate() {
        if *t == tag {
            mask |= 1 << i;
        }
    }
    mask
}

/// Returns a bitmask with one bit set per position in `tags` equal to `tag`.
/// `tags` must not exceed 32 entries (bucket capacities are capped well below
/// that).
#[inline]
pub fn tag_mask(tags: &[u8], tag: u8) -> u32 {
    debug_assert!(tags.len() <= 32);

    #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
    if tags.len() <= 16 {
        return x86_64_sse_tag_mask(tags, tag);
    }

    scalar_tag_mask(tags, tag)
}
