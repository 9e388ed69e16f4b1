//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责清单的批量处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：失败记录文件、启动日志
//! 2. **清单加载**：读取并校验所有有效行（`Vec<ManifestRow>`）
//! 3. **顺序处理**：严格按清单顺序逐行处理，不并发
//! 4. **资源管理**：持有源文档缓存，批次结束时关闭
//! 5. **失败策略**：某行失败后继续或中止，由配置决定
//! 6. **全局统计**：汇总所有行的处理结果

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{RowError, RowErrorKind};
use crate::infrastructure::{DocumentStore, LopdfStore};
use crate::models::{load_manifest, parse_range_expr, ManifestRow};
use crate::orchestrator::merge_processor::{MergeOutcome, MergeProcessor};
use crate::services::{FailureWriter, SourceCache};
use crate::utils::logging;
use crate::workflow::{RowCtx, RowFlow};

/// 批处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    /// 有效行总数
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 是否因失败而提前中止
    pub aborted: bool,
    /// 已写入的文件（按清单顺序）
    pub outputs: Vec<PathBuf>,
    /// 失败的行序号（从 1 开始）与错误分类
    pub failures: Vec<(usize, RowErrorKind)>,
}

impl BatchStats {
    /// 因中止而未处理的行数
    pub fn not_attempted(&self) -> usize {
        self.total - self.succeeded - self.failed
    }

    /// 全部成功
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

/// 顺序批处理器
///
/// 持有文档存储和源文档缓存；缓存只在连续行的源文档相同时复用。
pub struct BatchProcessor<S: DocumentStore> {
    store: S,
    cache: SourceCache<S::Document>,
    flow: RowFlow,
    failure_writer: FailureWriter,
    continue_on_error: bool,
}

impl<S: DocumentStore> BatchProcessor<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            cache: SourceCache::new(),
            flow: RowFlow::new(config),
            failure_writer: FailureWriter::with_path(config.failure_log_file.clone()),
            continue_on_error: config.continue_on_error,
        }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// 按顺序处理所有行
    ///
    /// 未启用的行直接忽略，不会访问源文档。
    pub fn run(&mut self, rows: &[ManifestRow]) -> BatchStats {
        let active: Vec<&ManifestRow> = rows.iter().filter(|row| row.active).collect();
        let mut stats = BatchStats {
            total: active.len(),
            ..Default::default()
        };

        for (index, row) in active.iter().enumerate() {
            let ctx = RowCtx::new(index + 1, stats.total, row.output_id.as_str());

            match self.flow.run(&mut self.store, &mut self.cache, row, &ctx) {
                Ok(outcome) => {
                    info!("{} ✓ 完成，共 {} 页", ctx, outcome.page_count);
                    stats.succeeded += 1;
                    stats.outputs.push(outcome.output_path);
                }
                Err(e) => {
                    error!("{} ❌ {}", ctx, e);
                    stats.failed += 1;
                    stats.failures.push((ctx.row_index, e.kind()));
                    self.record_failure(&ctx, row, &e);

                    if !self.continue_on_error {
                        let remaining = stats.total - ctx.row_index;
                        if remaining > 0 {
                            warn!("⛔ 未开启 continue_on_error，中止剩余 {} 行", remaining);
                            stats.aborted = true;
                        }
                        break;
                    }
                }
            }
        }

        self.cache.release(&mut self.store);
        stats
    }

    fn record_failure(&self, ctx: &RowCtx, row: &ManifestRow, error: &RowError) {
        if let Err(e) = self.failure_writer.write(ctx.row_index, row, error) {
            warn!(
                "⚠️ 写入失败记录 {} 失败: {}",
                self.failure_writer.path().display(),
                e
            );
        }
    }
}

/// 只解析不执行的检查结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DryRunReport {
    pub total: usize,
    /// 页码范围非法的行序号
    pub invalid_rows: Vec<usize>,
}

/// 解析每一行的页码范围并输出页序，不打开任何文档
pub fn plan_rows(rows: &[ManifestRow]) -> DryRunReport {
    let active: Vec<&ManifestRow> = rows.iter().filter(|row| row.active).collect();
    let mut report = DryRunReport {
        total: active.len(),
        ..Default::default()
    };

    for (index, row) in active.iter().enumerate() {
        let ctx = RowCtx::new(index + 1, report.total, row.output_id.as_str());
        match parse_range_expr(&row.range_expr) {
            Ok(spans) => {
                let order: Vec<String> = spans.iter().map(ToString::to_string).collect();
                info!(
                    "{} 源 {} → 页序 [{}]{}{}",
                    ctx,
                    row.source_id,
                    order.join(", "),
                    if row.insert_front_label { " +标签页" } else { "" },
                    if row.insert_end_blank { " +空白页" } else { "" },
                );
            }
            Err(e) => {
                error!("{} ❌ 页码范围 \"{}\" 非法: {}", ctx, row.range_expr, e);
                report.invalid_rows.push(ctx.row_index);
            }
        }
    }

    report
}

/// 应用主结构
pub struct App {
    config: Config,
    failure_writer: FailureWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let failure_writer = FailureWriter::with_path(config.failure_log_file.clone());
        failure_writer.init().with_context(|| {
            format!(
                "无法初始化失败记录文件: {}",
                config.failure_log_file.display()
            )
        })?;

        logging::log_startup(&config);

        Ok(Self {
            config,
            failure_writer,
        })
    }

    /// 运行页面抽取
    pub async fn run(&self, manifest_path: &Path) -> Result<BatchStats> {
        let rows = self.load_rows(manifest_path).await?;
        if rows.is_empty() {
            warn!("⚠️ 清单中没有待处理的行，程序结束");
            return Ok(BatchStats::default());
        }

        let config = self.config.clone();
        let stats = tokio::task::spawn_blocking(move || {
            let mut processor = BatchProcessor::new(LopdfStore::new(), &config);
            processor.run(&rows)
        })
        .await
        .context("批处理任务异常退出")?;

        logging::print_final_stats(&stats, self.failure_writer.path());
        Ok(stats)
    }

    /// 合并若干文档
    ///
    /// 不经过 `initialize`，不会改写失败记录文件。
    pub async fn merge(inputs: Vec<PathBuf>, output: PathBuf) -> Result<MergeOutcome> {
        info!("\n📚 正在合并 {} 个文档...", inputs.len());
        let outcome = tokio::task::spawn_blocking(move || {
            MergeProcessor::new(LopdfStore::new()).merge(&inputs, &output)
        })
        .await
        .context("合并任务异常退出")??;
        Ok(outcome)
    }

    /// 只检查清单，不读写任何文档
    pub async fn dry_run(&self, manifest_path: &Path) -> Result<DryRunReport> {
        let rows = self.load_rows(manifest_path).await?;
        let report = plan_rows(&rows);
        info!(
            "🔎 检查完成: {} 行，其中 {} 行页码范围非法",
            report.total,
            report.invalid_rows.len()
        );
        Ok(report)
    }

    async fn load_rows(&self, manifest_path: &Path) -> Result<Vec<ManifestRow>> {
        info!("\n📁 正在读取清单...");
        let rows = load_manifest(manifest_path)
            .await
            .with_context(|| format!("无法加载清单: {}", manifest_path.display()))?;
        logging::log_rows_loaded(rows.len(), manifest_path);
        Ok(rows)
    }
}
