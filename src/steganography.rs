//! # 位打包模块
//!
//! 系统中唯一的位操作原语：把一个值按 MSB 优先的顺序逐位写入载体窗口中
//! 每个字节的最低位，或者反向读出。载体字节的高 7 位始终保持不变。

use crate::constants::{BYTE_WINDOW, INT_WINDOW};

/// 将 `value` 的低 `window.len()` 位按 MSB 优先写入 `window` 的最低位。
///
/// `window[0]` 接收最高位。窗口长度不能超过 64。
fn pack_bits(value: u64, window: &mut [u8]) {
    let width = window.len();
    debug_assert!(width <= 64);

    for (i, byte) in window.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// 按 MSB 优先从 `window` 每个字节的最低位重建一个值。
fn unpack_bits(window: &[u8]) -> u64 {
    debug_assert!(window.len() <= 64);

    window
        .iter()
        .fold(0u64, |acc, &byte| (acc << 1) | (byte & 1) as u64)
}

/// 把一个字节隐写进 8 个载体字节。
pub fn pack_byte(value: u8, window: &mut [u8; BYTE_WINDOW]) {
    pack_bits(value as u64, window);
}

/// 从 8 个载体字节中恢复一个字节。
pub fn unpack_byte(window: &[u8; BYTE_WINDOW]) -> u8 {
    unpack_bits(window) as u8
}

/// 把一个 32 位长度字段隐写进 32 个载体字节。
pub fn pack_u32(value: u32, window: &mut [u8; INT_WINDOW]) {
    pack_bits(value as u64, window);
}

/// 从 32 个载体字节中恢复一个 32 位长度字段。
pub fn unpack_u32(window: &[u8; INT_WINDOW]) -> u32 {
    unpack_bits(window) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trips_for_every_value_and_background() {
        for background in [0x00u8, 0xFF, 0xAA, 0x55] {
            for value in 0..=u8::MAX {
                let mut window = [background; BYTE_WINDOW];
                pack_byte(value, &mut window);
                assert_eq!(unpack_byte(&window), value);
            }
        }
    }

    #[test]
    fn byte_is_packed_msb_first() {
        let mut window = [0u8; BYTE_WINDOW];
        pack_byte(0b1000_0001, &mut window);
        assert_eq!(window, [1, 0, 0, 0, 0, 0, 0, 1]);

        pack_byte(b'#', &mut window);
        assert_eq!(window, [0, 0, 1, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn packing_preserves_upper_seven_bits() {
        let original: [u8; BYTE_WINDOW] = [0x12, 0x35, 0x7E, 0x81, 0xFF, 0x00, 0xC4, 0x9B];
        for value in [0x00u8, 0xFF, 0x5A, b'*'] {
            let mut window = original;
            pack_byte(value, &mut window);
            for (packed, source) in window.iter().zip(original.iter()) {
                assert_eq!(packed & 0xFE, source & 0xFE);
            }
        }
    }

    #[test]
    fn u32_round_trips() {
        let samples = [0u32, 1, 4, 5, 0x8000_0000, 0xDEAD_BEEF, u32::MAX];
        for value in samples {
            let mut window = [0x6Cu8; INT_WINDOW];
            pack_u32(value, &mut window);
            assert_eq!(unpack_u32(&window), value);
        }
    }

    #[test]
    fn u32_is_packed_msb_first() {
        let mut window = [0xFEu8; INT_WINDOW];
        pack_u32(4, &mut window);
        let bits: Vec<u8> = window.iter().map(|b| b & 1).collect();
        let mut expected = vec![0u8; INT_WINDOW];
        expected[29] = 1;
        assert_eq!(bits, expected);
        assert!(window.iter().all(|b| b & 0xFE == 0xFE));
    }
}
