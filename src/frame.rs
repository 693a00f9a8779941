//! # 帧编解码模块
//!
//! 按固定顺序驱动位打包器处理帧中的各个字段：
//!
//! ```text
//! BMP 头部 (原样) | "#*" | 扩展名长度 | 扩展名 | 数据长度 | 数据 | 剩余像素 (原样)
//! ```
//!
//! 载体流上只有一个单向前进的游标，不会回退也不会跳过任何窗口。

use crate::constants::{BMP_HEADER_SIZE, BYTE_WINDOW, INT_WINDOW, MAGIC};
use crate::error::{FrameField, StegoError};
use crate::steganography::{pack_byte, pack_u32, unpack_byte, unpack_u32};
use log::{debug, info};
use std::io::{self, Read, Write};

/// 解码得到的完整帧。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 秘密文件扩展名，含前导点。
    pub extension: String,
    pub payload: Vec<u8>,
}

/// 编码端：从源图像读取载体窗口，写入秘密数据位后输出到目标。
pub struct FrameWriter<R, W> {
    source: R,
    sink: W,
    offset: u64,
}

impl<R: Read, W: Write> FrameWriter<R, W> {
    pub fn new(source: R, sink: W) -> Self {
        Self {
            source,
            sink,
            offset: 0,
        }
    }

    /// 已消耗的载体字节数 (包括头部)。
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 原样复制 54 字节的 BMP 头部。
    pub fn copy_header(&mut self) -> Result<(), StegoError> {
        info!("Copying image header");
        let mut header = [0u8; BMP_HEADER_SIZE];
        self.source
            .read_exact(&mut header)
            .map_err(|e| StegoError::from_window(e, FrameField::Header))?;
        self.sink
            .write_all(&header)
            .map_err(|e| StegoError::from_window(e, FrameField::Header))?;
        self.offset += BMP_HEADER_SIZE as u64;
        Ok(())
    }

    pub fn write_marker(&mut self) -> Result<(), StegoError> {
        info!("Encoding magic string signature");
        self.write_bytes(&MAGIC, FrameField::Marker)
    }

    /// 写入扩展名长度及扩展名本身。
    pub fn write_extension(&mut self, extension: &str) -> Result<(), StegoError> {
        info!("Encoding secret file extension {extension}");
        self.write_length(extension.len(), FrameField::ExtensionLength)?;
        self.write_bytes(extension.as_bytes(), FrameField::Extension)
    }

    /// 写入数据长度及全部秘密数据。
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<(), StegoError> {
        info!("Encoding secret file data ({} bytes)", payload.len());
        self.write_length(payload.len(), FrameField::PayloadLength)?;
        self.write_bytes(payload, FrameField::Payload)
    }

    /// 复制剩余未使用的像素字节，刷新并交还目标。
    pub fn finish(mut self) -> Result<W, StegoError> {
        info!("Copying left over image data");
        let copied = io::copy(&mut self.source, &mut self.sink)?;
        self.sink.flush()?;
        debug!(
            "Frame occupied {} carrier bytes, {} bytes copied verbatim",
            self.offset(),
            copied
        );
        Ok(self.sink)
    }

    fn write_length(&mut self, len: usize, field: FrameField) -> Result<(), StegoError> {
        let value = u32::try_from(len).map_err(|_| StegoError::LengthOverflow { field, len })?;

        let mut window = [0u8; INT_WINDOW];
        self.fill(&mut window, field)?;
        pack_u32(value, &mut window);
        self.emit(&window, field)
    }

    fn write_bytes(&mut self, bytes: &[u8], field: FrameField) -> Result<(), StegoError> {
        debug!(
            "Packing {} ({} bytes) at carrier offset {}",
            field,
            bytes.len(),
            self.offset
        );
        let mut window = [0u8; BYTE_WINDOW];
        bytes.iter().try_for_each(|&byte| {
            self.fill(&mut window, field)?;
            pack_byte(byte, &mut window);
            self.emit(&window, field)
        })
    }

    fn fill(&mut self, window: &mut [u8], field: FrameField) -> Result<(), StegoError> {
        self.source
            .read_exact(window)
            .map_err(|e| StegoError::from_window(e, field))
    }

    fn emit(&mut self, window: &[u8], field: FrameField) -> Result<(), StegoError> {
        self.sink
            .write_all(window)
            .map_err(|e| StegoError::from_window(e, field))?;
        self.offset += window.len() as u64;
        Ok(())
    }
}

/// 将扩展名和秘密数据编码成完整的隐写图像字节流。
///
/// # Errors
///
/// 载体流在任何字段处提前结束时返回 [`StegoError::UnexpectedEndOfStream`]，
/// 其余读写失败返回 [`StegoError::Io`]。
pub fn encode_frame<R: Read, W: Write>(
    source: R,
    sink: W,
    extension: &str,
    payload: &[u8],
) -> Result<W, StegoError> {
    let mut writer = FrameWriter::new(source, sink);
    writer.copy_header()?;
    writer.write_marker()?;
    writer.write_extension(extension)?;
    writer.write_payload(payload)?;
    writer.finish()
}

/// 解码端：按顺序读取各字段。
///
/// 长度字段按解码值信任，不与剩余流长度做比较；
/// 长度损坏导致读越界时报告 [`StegoError::UnexpectedEndOfStream`]。
pub struct FrameReader<R> {
    source: R,
    offset: u64,
    extension_size: Option<u32>,
    payload_size: Option<u32>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            offset: 0,
            extension_size: None,
            payload_size: None,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 扩展名长度，读取扩展名字段后才可用。
    pub fn extension_size(&self) -> Option<u32> {
        self.extension_size
    }

    /// 数据长度，读取数据长度字段后才可用。
    pub fn payload_size(&self) -> Option<u32> {
        self.payload_size
    }

    pub fn skip_header(&mut self) -> Result<(), StegoError> {
        let mut header = [0u8; BMP_HEADER_SIZE];
        self.source
            .read_exact(&mut header)
            .map_err(|e| StegoError::from_window(e, FrameField::Header))?;
        self.offset += BMP_HEADER_SIZE as u64;
        Ok(())
    }

    /// 读取并校验魔术标记。
    ///
    /// # Errors
    ///
    /// 标记不等于 `#*` 时返回 [`StegoError::MarkerMismatch`]。
    pub fn read_marker(&mut self) -> Result<(), StegoError> {
        info!("Decoding magic string signature");
        let mut found = [0u8; 2];
        for slot in found.iter_mut() {
            *slot = self.read_byte(FrameField::Marker)?;
        }

        if found != MAGIC {
            return Err(StegoError::MarkerMismatch { found });
        }
        Ok(())
    }

    pub fn read_extension(&mut self) -> Result<String, StegoError> {
        info!("Decoding secret file extension");
        let size = self.read_length(FrameField::ExtensionLength)?;
        self.extension_size = Some(size);

        let bytes = (0..size)
            .map(|_| self.read_byte(FrameField::Extension))
            .collect::<Result<Vec<u8>, StegoError>>()?;

        String::from_utf8(bytes).map_err(|e| StegoError::InvalidExtension(e.into_bytes()))
    }

    pub fn read_payload_size(&mut self) -> Result<u32, StegoError> {
        info!("Decoding secret file size");
        let size = self.read_length(FrameField::PayloadLength)?;
        self.payload_size = Some(size);
        Ok(size)
    }

    /// 读取数据长度并把秘密数据逐字节写入 `sink`，返回写入的字节数。
    pub fn read_payload_into<W: Write>(&mut self, sink: &mut W) -> Result<u64, StegoError> {
        let size = self.read_payload_size()?;
        info!("Decoding secret file data ({size} bytes)");

        for _ in 0..size {
            let byte = self.read_byte(FrameField::Payload)?;
            sink
                .write_all(&[byte])
                .map_err(|e| StegoError::from_window(e, FrameField::Payload))?;
        }
        sink.flush()?;
        debug!("Frame ends at carrier offset {}", self.offset());
        Ok(size as u64)
    }

    fn read_length(&mut self, field: FrameField) -> Result<u32, StegoError> {
        let mut window = [0u8; INT_WINDOW];
        self.fill(&mut window, field)?;
        let value = unpack_u32(&window);
        debug!("Decoded {field} = {value}");
        Ok(value)
    }

    fn read_byte(&mut self, field: FrameField) -> Result<u8, StegoError> {
        let mut window = [0u8; BYTE_WINDOW];
        self.fill(&mut window, field)?;
        Ok(unpack_byte(&window))
    }

    fn fill(&mut self, window: &mut [u8], field: FrameField) -> Result<(), StegoError> {
        self.source
            .read_exact(window)
            .map_err(|e| StegoError::from_window(e, field))?;
        self.offset += window.len() as u64;
        Ok(())
    }
}

/// 从隐写图像字节流中解码完整的帧。
pub fn decode_frame<R: Read>(source: R) -> Result<Frame, StegoError> {
    let mut reader = FrameReader::new(source);
    reader.skip_header()?;
    reader.read_marker()?;
    let extension = reader.read_extension()?;

    let mut payload = Vec::new();
    reader.read_payload_into(&mut payload)?;

    Ok(Frame { extension, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::required_bytes;
    use std::io::Cursor;

    /// 用可预测但不规则的字节填充的载体。
    fn carrier(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 + 11) as u8).collect()
    }

    fn encode(source: &[u8], extension: &str, payload: &[u8]) -> Result<Vec<u8>, StegoError> {
        encode_frame(source, Vec::new(), extension, payload)
    }

    #[test]
    fn hello_round_trips() {
        let source = carrier(1_000);
        let stego = encode(&source, ".txt", b"HELLO").unwrap();

        let frame = decode_frame(stego.as_slice()).unwrap();
        assert_eq!(frame.extension, ".txt");
        assert_eq!(frame.payload, vec![0x48, 0x45, 0x4C, 0x4C, 0x4F]);
    }

    #[test]
    fn output_keeps_size_header_and_tail() {
        let source = carrier(600);
        let stego = encode(&source, ".sh", b"echo hi").unwrap();
        assert_eq!(stego.len(), source.len());

        assert_eq!(&stego[..BMP_HEADER_SIZE], &source[..BMP_HEADER_SIZE]);

        let used = required_bytes(3, 7) as usize;
        assert_eq!(&stego[used..], &source[used..]);
    }

    #[test]
    fn only_lsbs_change_inside_the_frame() {
        let source = carrier(400);
        let stego = encode(&source, ".c", &[0xFF, 0x00, 0xA5]).unwrap();
        for (packed, original) in stego.iter().zip(source.iter()) {
            assert_eq!(packed & 0xFE, original & 0xFE);
        }
    }

    #[test]
    fn fields_land_at_documented_offsets() {
        let source = vec![0u8; 400];
        let stego = encode(&source, ".txt", b"HELLO").unwrap();

        let byte_at = |start: usize| {
            let window: [u8; BYTE_WINDOW] = stego[start..start + BYTE_WINDOW].try_into().unwrap();
            unpack_byte(&window)
        };
        let int_at = |start: usize| {
            let window: [u8; INT_WINDOW] = stego[start..start + INT_WINDOW].try_into().unwrap();
            unpack_u32(&window)
        };

        assert_eq!(byte_at(54), b'#');
        assert_eq!(byte_at(62), b'*');
        assert_eq!(int_at(70), 4);
        assert_eq!(byte_at(102), b'.');
        assert_eq!(byte_at(126), b't');
        assert_eq!(int_at(134), 5);
        assert_eq!(byte_at(166), b'H');
        assert_eq!(byte_at(198), b'O');
    }

    #[test]
    fn untouched_carrier_is_rejected() {
        let source = carrier(1_000);
        let err = decode_frame(source.as_slice()).unwrap_err();
        assert!(matches!(err, StegoError::MarkerMismatch { .. }));
    }

    #[test]
    fn all_zero_carrier_reports_found_marker() {
        let source = vec![0u8; 200];
        match decode_frame(source.as_slice()) {
            Err(StegoError::MarkerMismatch { found }) => assert_eq!(found, [0, 0]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_carrier_fails_on_the_missing_field() {
        let source = carrier(54 + 16 + 10);
        let err = encode(&source, ".txt", b"HELLO").unwrap_err();
        assert!(matches!(
            err,
            StegoError::UnexpectedEndOfStream {
                field: FrameField::ExtensionLength
            }
        ));

        let err = encode(&source[..20], ".txt", b"HELLO").unwrap_err();
        assert!(matches!(
            err,
            StegoError::UnexpectedEndOfStream {
                field: FrameField::Header
            }
        ));
    }

    #[test]
    fn corrupted_payload_length_reads_past_end() {
        let source = carrier(400);
        let mut stego = encode(&source, ".txt", b"HELLO").unwrap();

        // 把数据长度字段的最高位置 1。
        stego[134] |= 1;

        let err = decode_frame(stego.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            StegoError::UnexpectedEndOfStream {
                field: FrameField::Payload
            }
        ));
    }

    #[test]
    fn reader_tracks_sizes_progressively() {
        let source = carrier(400);
        let stego = encode(&source, ".txt", b"HELLO").unwrap();

        let mut reader = FrameReader::new(Cursor::new(stego));
        reader.skip_header().unwrap();
        reader.read_marker().unwrap();
        assert_eq!(reader.extension_size(), None);

        assert_eq!(reader.read_extension().unwrap(), ".txt");
        assert_eq!(reader.extension_size(), Some(4));
        assert_eq!(reader.payload_size(), None);

        let mut payload = Vec::new();
        assert_eq!(reader.read_payload_into(&mut payload).unwrap(), 5);
        assert_eq!(reader.payload_size(), Some(5));
        assert_eq!(reader.offset(), required_bytes(4, 5));
        assert_eq!(payload, b"HELLO");
    }

    #[test]
    fn short_sink_fails_on_the_payload() {
        let source = carrier(400);
        let stego = encode(&source, ".txt", b"HELLO").unwrap();

        let mut reader = FrameReader::new(stego.as_slice());
        reader.skip_header().unwrap();
        reader.read_marker().unwrap();
        reader.read_extension().unwrap();

        let mut buf = [0u8; 2];
        let mut sink: &mut [u8] = &mut buf;
        let err = reader.read_payload_into(&mut sink).unwrap_err();
        assert!(matches!(
            err,
            StegoError::UnexpectedEndOfStream {
                field: FrameField::Payload
            }
        ));
        assert_eq!(&buf, b"HE");
    }

    #[test]
    fn writer_offset_matches_required_bytes() {
        let source = carrier(400);
        let mut writer = FrameWriter::new(source.as_slice(), Vec::new());
        writer.copy_header().unwrap();
        writer.write_marker().unwrap();
        writer.write_extension(".txt").unwrap();
        writer.write_payload(b"HELLO").unwrap();
        assert_eq!(writer.offset(), required_bytes(4, 5));
    }

    #[test]
    fn binary_payload_round_trips() {
        let payload: Vec<u8> = (0..=255).collect();
        let source = carrier(required_bytes(4, 256) as usize + 1);
        let stego = encode(&source, ".txt", &payload).unwrap();
        assert_eq!(decode_frame(stego.as_slice()).unwrap().payload, payload);
    }
}
