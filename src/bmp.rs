//! # BMP 头部探测
//!
//! 只支持像素数据紧跟在 54 字节头部之后的 24 位未压缩 BMP。

use crate::capacity::image_capacity;
use crate::constants::BMP_HEADER_SIZE;
use crate::error::{FrameField, StegoError};
use std::io::{Read, Seek, SeekFrom};

/// 从 BMP 头部读取的图像信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpInfo {
    pub width: u32,
    pub height: u32,
    /// 高度字段为负数时像素行自上而下存储。
    pub top_down: bool,
}

impl BmpInfo {
    /// 解析 BITMAPFILEHEADER + BITMAPINFOHEADER。
    ///
    /// # Errors
    ///
    /// 签名、位深、压缩方式或像素偏移不符合要求时返回
    /// [`StegoError::UnsupportedBitmap`]。
    pub fn parse(header: &[u8; BMP_HEADER_SIZE]) -> Result<Self, StegoError> {
        if &header[0..2] != b"BM" {
            return Err(StegoError::UnsupportedBitmap(
                "missing 'BM' signature".to_string(),
            ));
        }

        let pixel_offset = u32_at(header, 10);
        if pixel_offset != BMP_HEADER_SIZE as u32 {
            return Err(StegoError::UnsupportedBitmap(format!(
                "pixel data starts at offset {pixel_offset}, expected {BMP_HEADER_SIZE}"
            )));
        }

        let bits_per_pixel = u16::from_le_bytes([header[28], header[29]]);
        if bits_per_pixel != 24 {
            return Err(StegoError::UnsupportedBitmap(format!(
                "{bits_per_pixel} bits per pixel, only 24-bit images are supported"
            )));
        }

        let compression = u32_at(header, 30);
        if compression != 0 {
            return Err(StegoError::UnsupportedBitmap(format!(
                "compression method {compression}, only uncompressed images are supported"
            )));
        }

        let width = u32_at(header, 18) as i32;
        let height = u32_at(header, 22) as i32;

        Ok(Self {
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
            top_down: height < 0,
        })
    }

    /// 可用于承载数据的字节数。
    pub fn capacity(&self) -> u64 {
        image_capacity(self.width, self.height)
    }
}

fn u32_at(header: &[u8; BMP_HEADER_SIZE], at: usize) -> u32 {
    u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
}

/// 读取头部并把读取位置恢复到流的开头。
pub fn probe<R: Read + Seek>(reader: &mut R) -> Result<BmpInfo, StegoError> {
    let mut header = [0u8; BMP_HEADER_SIZE];
    reader.seek(SeekFrom::Start(0))?;
    reader
        .read_exact(&mut header)
        .map_err(|e| StegoError::from_window(e, FrameField::Header))?;
    reader.seek(SeekFrom::Start(0))?;

    BmpInfo::parse(&header)
}
