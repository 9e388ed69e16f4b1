//! 单行处理流程 - 流程层
//!
//! 核心职责：定义"一行清单"的完整处理流程
//!
//! 流程顺序：
//! 1. 解析页码范围（失败时不做任何 I/O）
//! 2. 从缓存取得源文档
//! 3. 组装输出文档
//! 4. 路由并保存

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AssembleError, RowError};
use crate::infrastructure::{DocumentStore, PageContainer};
use crate::models::{parse_range_expr, ManifestRow, Rotation};
use crate::services::{
    ArchiveLayout, AssemblyRequest, DocumentAssembler, OutputRouter, SourceCache,
};
use crate::workflow::row_ctx::RowCtx;

/// 单行处理成功的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    /// 写入的文件
    pub output_path: PathBuf,
    /// 输出文档的页数（含辅助页）
    pub page_count: u32,
}

/// 单行处理流程
///
/// - 不持有任何文档资源（源文档由缓存持有，缓存由批处理层持有）
/// - 只依赖业务能力（services）
pub struct RowFlow {
    layout: ArchiveLayout,
    assembler: DocumentAssembler,
    router: OutputRouter,
    apply_rotation: bool,
}

impl RowFlow {
    pub fn new(config: &Config) -> Self {
        let layout = ArchiveLayout::from_config(config);
        Self {
            router: OutputRouter::new(layout.clone()),
            layout,
            assembler: DocumentAssembler::from_config(config),
            apply_rotation: config.apply_rotation,
        }
    }

    pub fn run<S: DocumentStore>(
        &self,
        store: &mut S,
        cache: &mut SourceCache<S::Document>,
        row: &ManifestRow,
        ctx: &RowCtx,
    ) -> Result<RowOutcome, RowError> {
        info!("{} 源 {} | 范围 {}", ctx, row.source_id, row.range_expr);

        let spans = parse_range_expr(&row.range_expr).map_err(|source| RowError::Parse {
            output_id: row.output_id.clone(),
            range_expr: row.range_expr.clone(),
            source,
        })?;
        debug!("{} 解析得到 {} 个区间", ctx, spans.len());

        let source_path = self.layout.source_path(&row.source_id);
        let source = cache.ensure_open(store, &row.source_id, &source_path)?;

        let request = AssemblyRequest {
            output_id: &row.output_id,
            insert_front_label: row.insert_front_label,
            insert_end_blank: row.insert_end_blank,
            rotation: self.rotation_for(row),
        };

        let document = self
            .assembler
            .assemble(store, source, &spans, &request)
            .map_err(|error| match error {
                AssembleError::OutOfBounds { span, page_count } => RowError::RangeBounds {
                    output_id: row.output_id.clone(),
                    source_id: row.source_id.clone(),
                    range_expr: row.range_expr.clone(),
                    span,
                    page_count,
                },
                // 复制过程中读不到页面对象，说明源文档损坏
                AssembleError::Document(source) => RowError::SourceAccess {
                    source_id: row.source_id.clone(),
                    path: source_path.clone(),
                    source,
                },
            })?;

        let page_count = document.page_count();
        let output_path = self.router.route_and_save(store, &row.output_id, document)?;

        Ok(RowOutcome {
            output_path,
            page_count,
        })
    }

    /// 旋转字段只有在配置显式开启时才生效
    fn rotation_for(&self, row: &ManifestRow) -> Option<Rotation> {
        if !self.apply_rotation {
            if let Some(rotation) = row.requested_rotation() {
                debug!(
                    "输出 {} 请求旋转 {} 度，未开启 apply_rotation，忽略",
                    row.output_id,
                    rotation.degrees()
                );
            }
            return None;
        }
        row.requested_rotation()
    }
}
