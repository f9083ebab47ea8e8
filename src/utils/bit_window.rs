/// Extract up to 32 bits from a byte sequence, starting at an arbitrary bit
/// offset, MSB-first. Offsets past the end of the data read as zero, which is
/// what lets variable-length keys share the fixed-window slot selection used
/// by directories.
pub fn read_bits(data: &[u8], offset: usize, count: u32) -> u32 {
    debug_assert!(count >= 1 && count <= 32, "window must be 1..=32 bits");

    let mut out: u64 = 0;
    let mut got: u32 = 0;
    let mut byte = offset / 8;
    let mut bit = (offset % 8) as u32;
    while got < count {
        let b = if byte < data.len() { data[byte] } else { 0 };
        let avail = 8 - bit;
        let take = (count - got).min(avail);
        let chunk = ((b as u64) >> (avail - take)) & ((1u64 << take) - 1);
        out = (out << take) | chunk;
        got += take;
        bit = 0;
        byte += 1;
    }
    out as u32
}

#[cfg(test)]
mod tests {
    use super::read_bits;

    #[test]
    fn test_aligned_windows() {
        let data = [0b1010_1100, 0b0101_0011];
        assert_eq!(read_bits(&data, 0, 8), 0b1010_1100);
        assert_eq!(read_bits(&data, 8, 8), 0b0101_0011);
        assert_eq!(read_bits(&data, 0, 16), 0b1010_1100_0101_0011);
    }

    #[test]
    fn test_unaligned_windows() {
        let data = [0b1010_1100, 0b0101_0011];
        assert_eq!(read_bits(&data, 0, 2), 0b10);
        assert_eq!(read_bits(&data, 2, 2), 0b10);
        assert_eq!(read_bits(&data, 4, 2), 0b11);
        assert_eq!(read_bits(&data, 6, 4), 0b0001);
        assert_eq!(read_bits(&data, 7, 3), 0b001);
        assert_eq!(read_bits(&data, 3, 9), 0b0_1100_0101);
    }

    #[test]
    fn test_windows_past_the_end_are_zero() {
        let data = [0xff];
        assert_eq!(read_bits(&data, 8, 8), 0);
        assert_eq!(read_bits(&data, 4, 8), 0xf0);
        assert_eq!(read_bits(&data, 100, 32), 0);
    }
}
