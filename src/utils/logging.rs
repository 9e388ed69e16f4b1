/// 日志工具模块
///
/// 提供日志初始化和批处理各阶段的输出
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::BatchStats;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用（例如测试中）不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 归档页面抽取");
    info!("📁 归档根目录: {}", config.archive_root.display());
    info!("📄 源文档目录: {}", config.source_folder);
    info!("{}", "=".repeat(60));
}

/// 记录清单加载信息
///
/// # 参数
/// - `total`: 有效行数
/// - `manifest_path`: 清单路径
pub fn log_rows_loaded(total: usize, manifest_path: &Path) {
    info!("✓ 清单 {} 中找到 {} 行待处理", manifest_path.display(), total);
    info!("📋 将按清单顺序逐行处理\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 批处理统计
/// - `failure_log`: 失败记录文件路径
pub fn print_final_stats(stats: &BatchStats, failure_log: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.succeeded, stats.total);
    info!("❌ 失败: {}", stats.failed);
    if stats.aborted {
        info!("⛔ 已中止，未处理: {}", stats.not_attempted());
    }
    info!("{}", "=".repeat(60));
    if stats.failed > 0 {
        info!("\n失败记录已保存至: {}", failure_log.display());
    }
}
