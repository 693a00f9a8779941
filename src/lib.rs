//! # bmp_lsb_stego 库
//!
//! 本库包含 BMP 最低有效位隐写工具的核心逻辑：位打包、帧编解码与容量检查，
//! 以及命令行层使用的参数与文件处理。

// 声明库包含的所有模块。

pub mod bmp;
pub mod capacity;
pub mod cli;
pub mod constants;
pub mod context;
pub mod error;
pub mod frame;
pub mod handler;
pub mod steganography;

pub use error::StegoError;
pub use frame::{Frame, decode_frame, encode_frame};
