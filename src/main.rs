use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

use bmp_lsb_stego::{
    cli::{Cli, Commands},
    handler::{handle_hide, handle_recover},
};

/// 初始化日志：默认 INFO 级别，`RUST_LOG` 可覆盖，`--quiet` 降为 WARN。
fn init_logger(quiet: bool) {
    let default_level = if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    Builder::from_env(Env::default().default_filter_or(default_level.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令（`hide` 或 `recover`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.quiet);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
    }
}
