/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制，隐写从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 每个像素占用的颜色通道字节数 (24 位 BMP)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 帧起始的魔术标记，解码时用于确认图像由本工具生成。
pub const MAGIC: [u8; 2] = *b"#*";

/// 隐写单个字节所需的载体字节数。
/// 每个载体字节的最低位存储 1 bit，因此 8 bits 需要 8 个载体字节。
pub const BYTE_WINDOW: usize = 8;

/// 隐写一个 `u32` 长度字段所需的载体字节数 (32 bits)。
pub const INT_WINDOW: usize = 32;

/// 允许隐藏的秘密文件扩展名 (含前导点)。
pub const SECRET_EXTENSIONS: [&str; 3] = [".txt", ".c", ".sh"];

/// 载体图像与输出图像必须使用的扩展名。
pub const IMAGE_EXTENSION: &str = "bmp";

/// 未指定输出路径时生成的隐写图像文件名。
pub const DEFAULT_STEGO_NAME: &str = "stego.bmp";

/// 未指定输出路径时恢复文件的主文件名，扩展名取自帧内记录。
pub const DEFAULT_SECRET_STEM: &str = "secret_output";
