//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复 .txt / .c / .sh 文件。"
)]
pub struct Cli {
    /// 只输出警告和错误日志。
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏) 和 recover (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在 24 位 BMP 图像中隐藏文件内容。
    #[command(visible_aliases = ["encode", "e"])]
    Hide(HideArgs),

    /// 从经过隐写的 BMP 图像中恢复隐藏的文件。
    #[command(visible_aliases = ["decode", "d"])]
    Recover(RecoverArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (.bmp)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的秘密文件路径 (.txt / .c / .sh)。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 结果图像的输出路径 (.bmp)，默认为输入图像所在目录下的 stego.bmp。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 目标文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径 (.bmp)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复文件的输出路径。未给出扩展名时追加隐藏时记录的扩展名，
    /// 默认为图像所在目录下的 secret_output。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 目标文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}
