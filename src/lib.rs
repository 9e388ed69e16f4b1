//! # Archive Splicer
//!
//! 按清单从扫描归档中抽取页面、重新排序并生成新文档的工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有文档资源，只暴露页面容器能力
//! - `DocumentStore` / `PageContainer` - 打开、新建、保存、复制页面、插入文字页
//! - `LopdfStore` - 基于 lopdf 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文档
//! - `SourceCache` - 最多持有一个打开的源文档
//! - `DocumentAssembler` - 按区间复制页面，插入标签页 / 空白页
//! - `OutputRouter` - 按输出标识前缀决定目录并保存
//! - `FailureWriter` - 写失败记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行清单"的完整处理流程
//! - `RowCtx` - 上下文封装（行序号 + 输出标识）
//! - `RowFlow` - 流程编排（parse → open → assemble → save）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 清单批处理器，管理资源和失败策略
//! - `orchestrator/merge_processor` - 文档合并
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, RowError, RowErrorKind};
pub use infrastructure::{DocumentStore, LopdfStore, PageContainer};
pub use models::{parse_range_expr, ManifestRow, PageSpan};
pub use orchestrator::{App, BatchProcessor, BatchStats};
pub use workflow::{RowCtx, RowFlow, RowOutcome};
