//! 失败记录服务 - 业务能力层
//!
//! 只负责把处理失败的行追加到失败记录文件，不关心流程

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::error::RowError;
use crate::models::ManifestRow;

/// 失败记录服务
pub struct FailureWriter {
    log_path: PathBuf,
}

impl FailureWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// 写入带时间戳的文件头（覆盖旧文件）
    pub fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n页面抽取失败记录 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.log_path, header)?;
        Ok(())
    }

    /// 追加一条失败记录
    ///
    /// # 参数
    /// - `row_index`: 行序号（从 1 开始）
    /// - `row`: 失败的清单行
    /// - `error`: 失败原因
    pub fn write(&self, row_index: usize, row: &ManifestRow, error: &RowError) -> Result<()> {
        debug!("写入失败记录: 第 {} 行 | 输出 {}", row_index, row.output_id);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let line = format!(
            "第 {} 行 | 源 {} | 输出 {} | 范围 {} | {:?} | {}\n",
            row_index,
            row.source_id,
            row.output_id,
            row.range_expr,
            error.kind(),
            error
        );
        file.write_all(line.as_bytes())?;

        Ok(())
    }
}
