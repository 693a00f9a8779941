//! # 容量检查模块
//!
//! 在修改任何载体字节之前，判断图像是否足以容纳整个帧。

use crate::constants::{BMP_HEADER_SIZE, BYTE_WINDOW, BYTES_PER_PIXEL, INT_WINDOW, MAGIC};
use crate::error::{Shortfall, StegoError};

/// 编码整个帧所需的字节数 (包含 54 字节的 BMP 头部)。超出 `u64` 时饱和。
pub fn required_bytes(extension_len: u64, payload_len: u64) -> u64 {
    let byte_window = BYTE_WINDOW as u64;
    let fixed = BMP_HEADER_SIZE as u64 + byte_window * MAGIC.len() as u64 + 2 * INT_WINDOW as u64;

    fixed
        .saturating_add(byte_window.saturating_mul(extension_len))
        .saturating_add(byte_window.saturating_mul(payload_len))
}

/// 图像的载体容量：宽 × 高 × 每像素字节数。
///
/// 乘积超出 `u64` 时饱和为 `u64::MAX`。
pub fn image_capacity(width: u32, height: u32) -> u64 {
    (width as u64 * height as u64).saturating_mul(BYTES_PER_PIXEL)
}

/// 检查图像能否承载给定的扩展名和秘密数据。
///
/// # Errors
///
/// 返回 [`StegoError::InsufficientCapacity`]。
pub fn check_capacity(
    width: u32,
    height: u32,
    extension_len: u64,
    payload_len: u64,
) -> Result<u64, StegoError> {
    if payload_len == 0 {
        return Err(StegoError::InsufficientCapacity(Shortfall::EmptyPayload));
    }
    check_capacity_bytes(image_capacity(width, height), extension_len, payload_len)
}

/// 以字节数表示容量的检查。
///
/// 容量必须严格大于所需字节数；容量恰好相等视为不足。
/// 空的秘密数据无论容量多大都会被拒绝。
pub fn check_capacity_bytes(
    available: u64,
    extension_len: u64,
    payload_len: u64,
) -> Result<u64, StegoError> {
    if payload_len == 0 {
        return Err(StegoError::InsufficientCapacity(Shortfall::EmptyPayload));
    }

    let required = required_bytes(extension_len, payload_len);
    if available > required {
        Ok(available)
    } else {
        Err(StegoError::InsufficientCapacity(Shortfall::TooSmall {
            required,
            available,
        }))
    }
}
