//! In-place conversion of little-endian wire data to native byte order.
//!
//! On little-endian hosts the `convert_*` functions are no-ops.

/// Reverse the bytes of every 2-byte word
pub fn swap_bytes16(data: &mut [u8]) {
    for word in data.chunks_exact_mut(2) {
        word.swap(0, 1);
    }
}

/// Reverse the bytes of every 4-byte word
pub fn swap_bytes32(data: &mut [u8]) {
    for word in data.chunks_exact_mut(4) {
        word.reverse();
    }
}

/// Little-endian to native for 16-bit elements
pub fn convert_endian16(data: &mut [u8]) {
    if cfg!(target_endian = "big") {
        swap_bytes16(data);
    }
}

/// Little-endian to native for 32-bit elements
pub fn convert_endian32(data: &mut [u8]) {
    if cfg!(target_endian = "big") {
        swap_bytes32(data);
    }
}

/// Little-endian to native for elements of `width` bytes.
///
/// 8-byte elements are converted as two independent 32-bit words, not as one 64-bit word.
pub fn convert_endian(data: &mut [u8], width: usize) {
    match width {
        2 => convert_endian16(data),
        4 | 8 => convert_endian32(data),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap16() {
        let mut data = [1u8, 2, 3, 4];
        swap_bytes16(&mut data);
        assert_eq!(data, [2, 1, 4, 3]);
    }

    #[test]
    fn test_swap32_on_64bit_values_swaps_halves_independently() {
        let mut data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_bytes32(&mut data);
        assert_eq!(data, [4, 3, 2, 1, 8, 7, 6, 5]);
    }

    #[test]
    fn test_convert_matches_from_le() {
        let value = 0x1234_5678u32;
        let mut data = value.to_le_bytes();
        convert_endian32(&mut data);
        assert_eq!(u32::from_ne_bytes(data), value);

        let value = 0xBEEFu16;
        let mut data = value.to_le_bytes();
        convert_endian(&mut data, 2);
        assert_eq!(u16::from_ne_bytes(data), value);
    }
}
