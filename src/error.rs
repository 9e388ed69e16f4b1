use std::path::PathBuf;

use thiserror::Error;

use crate::models::PageSpan;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 清单文件错误
    #[error("清单错误: {0}")]
    Manifest(#[from] ManifestError),
    /// 单行处理错误
    #[error("行处理错误: {0}")]
    Row(#[from] RowError),
    /// 文档操作错误（合并工具等不经过清单的路径）
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
}

/// 页码范围表达式解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    /// 表达式为空
    #[error("页码范围为空")]
    EmptyExpression,
    /// 逗号之间没有内容，例如 "1-3,"
    #[error("页码范围 \"{expr}\" 中存在空项")]
    EmptyToken { expr: String },
    /// 页码不是数字
    #[error("无法解析页码 \"{token}\"")]
    NotANumber { token: String },
    /// 范围不是恰好两个页码
    #[error("范围 \"{token}\" 必须恰好包含两个页码，实际为 {operands} 个")]
    WrongOperandCount { token: String, operands: usize },
    /// 页码从 1 开始
    #[error("页码必须从 1 开始: \"{token}\"")]
    ZeroPage { token: String },
}

/// 页面容器（文档读写）错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 读写文件失败
    #[error("读写文件失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// PDF 解析失败
    #[error("PDF 解析失败 ({}): {source}", .path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    /// PDF 编码失败
    #[error("PDF 编码失败: {source}")]
    Encode {
        #[source]
        source: lopdf::Error,
    },
    /// 页码超出文档页数
    #[error("页码 {page} 超出范围 [1, {page_count}]")]
    PageOutOfRange { page: u32, page_count: u32 },
    /// 页面对象缺失或损坏
    #[error("第 {page} 页的页面对象缺失或损坏")]
    MissingPage { page: u32 },
}

/// 组装输出文档时的错误
#[derive(Debug, Error)]
pub enum AssembleError {
    /// 请求的区间超出源文档页数
    #[error("范围 {span} 超出源文档页数 {page_count}")]
    OutOfBounds { span: PageSpan, page_count: u32 },
    /// 复制页面或插入辅助页失败
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// 清单文件错误（加载阶段即拒绝）
#[derive(Debug, Error)]
pub enum ManifestError {
    /// 读取清单失败
    #[error("读取清单失败 ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// CSV 格式错误
    #[error("CSV 格式错误: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },
    /// 字段数量不对
    #[error("第 {line} 行: 需要 {expected} 个字段，实际为 {actual} 个")]
    FieldCount {
        line: u64,
        expected: usize,
        actual: usize,
    },
    /// Y/N 字段取值非法
    #[error("第 {line} 行: 字段 {field} 只能是 Y 或 N，实际为 \"{value}\"")]
    InvalidFlag {
        line: u64,
        field: &'static str,
        value: String,
    },
    /// 必填字段为空
    #[error("第 {line} 行: 字段 {field} 不能为空")]
    EmptyField { line: u64, field: &'static str },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({}): {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 单行处理失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    Parse,
    SourceAccess,
    RangeBounds,
    OutputWrite,
}

/// 单行处理错误
///
/// 每一种错误都会中止当前行，是否继续后续行由批处理层决定。
#[derive(Debug, Error)]
pub enum RowError {
    /// 页码范围表达式非法，发生在任何 I/O 之前
    #[error("输出 {output_id}: 页码范围 \"{range_expr}\" 非法: {source}")]
    Parse {
        output_id: String,
        range_expr: String,
        #[source]
        source: RangeParseError,
    },
    /// 源文档无法打开或已损坏
    #[error("源文档 {source_id} 无法访问 ({}): {source}", .path.display())]
    SourceAccess {
        source_id: String,
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
    /// 源文档此前已打开失败，不再重试
    #[error("源文档 {source_id} 此前打开失败，跳过")]
    SourceUnavailable { source_id: String },
    /// 页码超出源文档页数
    #[error("输出 {output_id}: 范围 {span} 超出源文档 {source_id} 的页数 {page_count} (表达式 \"{range_expr}\")")]
    RangeBounds {
        output_id: String,
        source_id: String,
        range_expr: String,
        span: PageSpan,
        page_count: u32,
    },
    /// 输出目录或文件写入失败
    #[error("输出 {output_id} 写入失败 ({}): {source}", .path.display())]
    OutputWrite {
        output_id: String,
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

impl RowError {
    /// 错误分类
    pub fn kind(&self) -> RowErrorKind {
        match self {
            RowError::Parse { .. } => RowErrorKind::Parse,
            RowError::SourceAccess { .. } | RowError::SourceUnavailable { .. } => {
                RowErrorKind::SourceAccess
            }
            RowError::RangeBounds { .. } => RowErrorKind::RangeBounds,
            RowError::OutputWrite { .. } => RowErrorKind::OutputWrite,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
