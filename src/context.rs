//! # 编解码上下文
//!
//! 每次操作创建一个上下文，独占该操作打开的文件，操作结束时随上下文一起释放。

use crate::bmp::{self, BmpInfo};
use crate::capacity::check_capacity;
use crate::error::StegoError;
use crate::frame::{FrameReader, encode_frame};
use log::info;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

fn open(path: &Path) -> Result<File, StegoError> {
    let file = File::open(path).map_err(|source| StegoError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Opened {}", path.display());
    Ok(file)
}

/// 编码一次所需的全部状态。派生字段在创建时计算，之后不再改变。
pub struct EncodingContext {
    source: BufReader<File>,
    image: BmpInfo,
    payload: Vec<u8>,
    extension: String,
}

impl EncodingContext {
    /// 打开源图像并读取秘密文件。`extension` 含前导点。
    pub fn open(image: &Path, secret: &Path, extension: &str) -> Result<Self, StegoError> {
        let mut source = open(image)?;
        let info = bmp::probe(&mut source)?;

        let mut payload = Vec::new();
        open(secret)?.read_to_end(&mut payload)?;

        Ok(Self {
            source: BufReader::new(source),
            image: info,
            payload,
            extension: extension.to_string(),
        })
    }

    pub fn image_capacity_bytes(&self) -> u64 {
        self.image.capacity()
    }

    pub fn payload_size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn check_capacity(&self) -> Result<u64, StegoError> {
        info!(
            "Checking capacity of a {}x{} image for {} bytes of secret data",
            self.image.width,
            self.image.height,
            self.payload.len()
        );
        check_capacity(
            self.image.width,
            self.image.height,
            self.extension.len() as u64,
            self.payload_size_bytes(),
        )
    }

    /// 将整个帧编码写入 `sink`，消耗上下文。
    pub fn encode_into<W: Write>(self, sink: W) -> Result<W, StegoError> {
        encode_frame(self.source, sink, &self.extension, &self.payload)
    }
}

/// 解码一次所需的状态。扩展名在读取后才可用。
pub struct DecodingContext {
    path: PathBuf,
    reader: FrameReader<BufReader<File>>,
    image: BmpInfo,
    extension: Option<String>,
}

impl DecodingContext {
    pub fn open(stego: &Path) -> Result<Self, StegoError> {
        let mut file = open(stego)?;
        let image = bmp::probe(&mut file)?;

        let mut reader = FrameReader::new(BufReader::new(file));
        reader.skip_header()?;

        Ok(Self {
            path: stego.to_path_buf(),
            reader,
            image,
            extension: None,
        })
    }

    pub fn image(&self) -> BmpInfo {
        self.image
    }

    /// 校验魔术标记并读取扩展名。
    pub fn read_preamble(&mut self) -> Result<&str, StegoError> {
        self.reader.read_marker()?;
        let extension = self.reader.read_extension()?;
        info!(
            "{} carries a hidden '{}' file",
            self.path.display(),
            extension
        );
        Ok(self.extension.insert(extension).as_str())
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn payload_size(&self) -> Option<u32> {
        self.reader.payload_size()
    }

    /// 将秘密数据写入 `sink`，返回写入的字节数。
    pub fn extract_into<W: Write>(&mut self, sink: &mut W) -> Result<u64, StegoError> {
        self.reader.read_payload_into(sink)
    }
}
