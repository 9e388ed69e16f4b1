use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use archive_splicer::utils::logging;
use archive_splicer::{App, Config};

/// 按清单从归档中抽取页面、重组文档
#[derive(Debug, Parser)]
#[command(name = "splicer", version)]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 归档根目录（覆盖配置）
    #[arg(long, global = true)]
    archive_root: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 按清单抽取页面
    Extract {
        /// 清单变体，读取 <manifest_folder>/data_<DATA>.csv
        #[arg(long)]
        data: Option<String>,

        /// 直接指定清单文件（优先于 --data）
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// 某行失败后继续处理后续行
        #[arg(long)]
        continue_on_error: bool,

        /// 只解析清单，不读写文档
        #[arg(long)]
        dry_run: bool,
    },
    /// 把若干文档按顺序合并为一个
    Merge {
        /// 输出文件
        #[arg(short, long)]
        output: PathBuf,

        /// 输入文件（按顺序）
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides()?;
    if let Some(root) = cli.archive_root {
        config.archive_root = root;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    match cli.command {
        Command::Extract {
            data,
            manifest,
            continue_on_error,
            dry_run,
        } => {
            config.continue_on_error |= continue_on_error;
            let manifest_path = manifest.unwrap_or_else(|| config.manifest_path(data.as_deref()));
            let app = App::initialize(config).await?;

            if dry_run {
                let report = app.dry_run(&manifest_path).await?;
                if !report.invalid_rows.is_empty() {
                    bail!("{} 行页码范围非法", report.invalid_rows.len());
                }
                return Ok(());
            }

            let stats = app.run(&manifest_path).await?;
            if !stats.is_clean() {
                bail!("{}/{} 行处理失败", stats.failed, stats.total);
            }
        }
        Command::Merge { output, inputs } => {
            App::merge(inputs, output).await?;
        }
    }

    Ok(())
}
