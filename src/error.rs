use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 帧中的字段，用于在出错时指明载体流在哪个窗口处中断。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    Header,
    Marker,
    ExtensionLength,
    Extension,
    PayloadLength,
    Payload,
}

impl fmt::Display for FrameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameField::Header => "BMP header",
            FrameField::Marker => "magic marker",
            FrameField::ExtensionLength => "extension length",
            FrameField::Extension => "extension",
            FrameField::PayloadLength => "payload length",
            FrameField::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// 容量检查失败的具体原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    /// 秘密文件为空，没有可隐藏的数据。
    EmptyPayload,
    /// 图像像素字节数不足以容纳整个帧。
    TooSmall { required: u64, available: u64 },
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortfall::EmptyPayload => f.write_str("the secret file is empty, nothing to hide"),
            Shortfall::TooSmall {
                required,
                available,
            } => write!(f, "required {required} bytes, available {available} bytes"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StegoError {
    /// 无法打开源文件或目标文件。
    #[error("Unable to open file {}", path.display())]
    FileOpen { path: PathBuf, source: io::Error },

    /// 图像容量不足或秘密文件为空。
    #[error("Not enough space in the image: {0}")]
    InsufficientCapacity(Shortfall),

    /// 解码出的标记与 `#*` 不一致。
    #[error("Magic marker mismatch (found {found:02x?}): the image holds no hidden file or is corrupted")]
    MarkerMismatch { found: [u8; 2] },

    /// 某个字段的窗口无法完整读取。
    #[error("Unexpected end of stream while processing the {field}")]
    UnexpectedEndOfStream { field: FrameField },

    /// 解码出的扩展名不是合法的 UTF-8。
    #[error("Decoded file extension {0:02x?} is not valid text")]
    InvalidExtension(Vec<u8>),

    /// 长度超出 32 位长度字段的表示范围。
    #[error("The {field} ({len} bytes) does not fit in a 32-bit length field")]
    LengthOverflow { field: FrameField, len: usize },

    /// 不是 24 位未压缩 BMP。
    #[error("Unsupported bitmap: {0}")]
    UnsupportedBitmap(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StegoError {
    /// 将读写窗口时的 `io::Error` 映射为带字段信息的错误。
    pub(crate) fn from_window(err: io::Error, field: FrameField) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => {
                StegoError::UnexpectedEndOfStream { field }
            }
            _ => StegoError::Io(err),
        }
    }
}
