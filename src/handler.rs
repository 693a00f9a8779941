//! # 命令处理逻辑模块
//!
//! 包含处理 `hide` 和 `recover` 子命令的高级业务逻辑。
//! 本模块负责校验参数、协调文件 I/O、调用帧编解码以及向用户报告结果。
//!
//! 输出总是先写入目标目录下的临时文件，整个帧处理成功后才重命名为目标路径，
//! 失败时临时文件被删除，不会留下不完整的输出。

use crate::cli::{HideArgs, RecoverArgs};
use crate::constants::{DEFAULT_SECRET_STEM, DEFAULT_STEGO_NAME, IMAGE_EXTENSION, SECRET_EXTENSIONS};
use crate::context::{DecodingContext, EncodingContext};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{ImageFormat, ImageReader};
use log::info;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 处理 'Hide' 命令的执行逻辑。
///
/// 校验文件名、检查容量，然后把秘密文件编码进图像并写入目标路径。
///
/// # Arguments
///
/// * `args` - 包含源图像、秘密文件、可选输出路径及 `force` 标志的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输入图像或输出路径不是 `.bmp` 文件，或秘密文件扩展名不受支持。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法打开输入文件，或图像不是 24 位未压缩 BMP。
/// * 秘密文件为空，或图像没有足够的空间。
/// * 写入目标文件失败。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    info!("Validating arguments");
    ensure_bmp_name(&args.image, "Source image")?;

    let extension = secret_extension(&args.secret).with_context(|| {
        format!(
            "Secret file {} must be one of: {}",
            args.secret.to_string_lossy().red().bold(),
            SECRET_EXTENSIONS.join(", ")
        )
    })?;

    let dest = match args.dest {
        Some(dest) => {
            ensure_bmp_name(&dest, "Output image")?;
            dest
        }
        None => {
            let dest = args.image.with_file_name(DEFAULT_STEGO_NAME);
            info!(
                "Output file not given, using {} as default",
                dest.display()
            );
            dest
        }
    };
    ensure_not_clobbering(&dest, args.force)?;
    ensure_bmp_content(&args.image)?;

    info!("Opening required files");
    let context = EncodingContext::open(&args.image, &args.secret, &extension)?;
    context.check_capacity()?;
    info!(
        "Capacity available: {} bytes for {} bytes of secret data",
        context.image_capacity_bytes(),
        context.payload_size_bytes()
    );

    write_atomically(&dest, args.force, |file| {
        context.encode_into(BufWriter::new(file))?;
        Ok(())
    })
    .with_context(|| {
        format!(
            "Failed to write the stego image: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 读取隐写图像、校验魔术标记，按帧中记录的扩展名生成输出路径并写出秘密文件。
///
/// # Arguments
///
/// * `args` - 包含隐写图像、可选输出路径及 `force` 标志的 `RecoverArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输入图像不是 `.bmp` 文件，或无法打开。
/// * 图像中没有本工具写入的帧 (魔术标记不匹配)。
/// * 帧数据被截断或损坏。
/// * 目标文件已存在且未指定 `--force`，或写入失败。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    info!("Validating arguments");
    ensure_bmp_name(&args.image, "Stego image")?;

    info!("Opening required files");
    let mut context = DecodingContext::open(&args.image)?;
    let image = context.image();
    info!(
        "Stego image is {}x{} ({}, {} carrier bytes)",
        image.width,
        image.height,
        if image.top_down { "top-down" } else { "bottom-up" },
        image.capacity()
    );
    let extension = context.read_preamble()?.to_string();
    anyhow::ensure!(
        is_safe_extension(&extension),
        "The hidden file extension {} is not usable as a file name",
        extension.escape_debug().to_string().red().bold()
    );

    let dest = recovered_path(&args.image, args.output, &extension);
    ensure_not_clobbering(&dest, args.force)?;

    let mut written = 0;
    write_atomically(&dest, args.force, |file| {
        let mut sink = BufWriter::new(file);
        written = context.extract_into(&mut sink)?;
        sink.flush()?;
        Ok(())
    })
    .with_context(|| {
        format!(
            "Failed to recover the hidden file into {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The file ({} bytes) has been successfully recovered and saved: {}",
        written.to_string().green(),
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

fn ensure_bmp_name(path: &Path, role: &str) -> Result<()> {
    anyhow::ensure!(
        path.extension().is_some_and(|ext| ext == IMAGE_EXTENSION),
        "{} is not a .bmp file: {}",
        role,
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 确认文件内容可被识别为 BMP，而不仅仅是扩展名符合。
fn ensure_bmp_content(path: &Path) -> Result<()> {
    let format = File::open(path)
        .and_then(|file| ImageReader::new(BufReader::new(file)).with_guessed_format())
        .with_context(|| {
            format!(
                "Unable to read image file: {}",
                path.to_string_lossy().red().bold()
            )
        })?
        .format();

    anyhow::ensure!(
        format == Some(ImageFormat::Bmp),
        "{} does not contain BMP image data",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 返回受支持的秘密文件扩展名 (含前导点)。
fn secret_extension(path: &Path) -> Option<String> {
    let extension = format!(".{}", path.extension()?.to_str()?);
    SECRET_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn is_safe_extension(extension: &str) -> bool {
    extension
        .strip_prefix('.')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// 恢复文件的输出路径。
fn recovered_path(image: &Path, output: Option<PathBuf>, extension: &str) -> PathBuf {
    match output {
        Some(path) if path.extension().is_some() => path,
        Some(path) => {
            let mut name = OsString::from(path);
            name.push(extension);
            PathBuf::from(name)
        }
        None => image.with_file_name(format!("{DEFAULT_SECRET_STEM}{extension}")),
    }
}

fn ensure_not_clobbering(dest: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !dest.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        dest.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 在 `dest` 所在目录创建临时文件，`fill` 成功后再重命名为 `dest`。
fn write_atomically<F>(dest: &Path, force: bool, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Unable to create a temporary file in {}", dir.display()))?;
    fill(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;

    if force {
        tmp.persist(dest)?;
    } else {
        tmp.persist_noclobber(dest)?;
    }
    info!("Saved {}", dest.display());
    Ok(())
}
