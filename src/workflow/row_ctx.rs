//! 行处理上下文
//!
//! 封装"我正在处理清单的第几行、输出什么"这一信息

use std::fmt::Display;

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行序号（仅用于日志显示，从 1 开始）
    pub row_index: usize,

    /// 本批次的有效行总数
    pub total_rows: usize,

    /// 输出文档标识
    pub output_id: String,
}

impl RowCtx {
    pub fn new(row_index: usize, total_rows: usize, output_id: impl Into<String>) -> Self {
        Self {
            row_index,
            total_rows,
            output_id: output_id.into(),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[行 {}/{} 输出 {}]",
            self.row_index, self.total_rows, self.output_id
        )
    }
}
