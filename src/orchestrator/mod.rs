//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 清单批处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 加载清单（Vec<ManifestRow>）
//! - 持有源文档缓存，严格按行顺序处理
//! - 决定某行失败后继续还是中止
//!
//! ### `merge_processor` - 合并处理器
//! - 把若干文档的全部页面按顺序拼接
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ManifestRow>)
//!     ↓
//! workflow::RowFlow (处理单行)
//!     ↓
//! services (能力层：cache / assembler / router)
//!     ↓
//! infrastructure (基础设施：DocumentStore / PageContainer)
//! ```

pub mod batch_processor;
pub mod merge_processor;

// 重新导出主要类型
pub use batch_processor::{plan_rows, App, BatchProcessor, BatchStats, DryRunReport};
pub use merge_processor::{MergeOutcome, MergeProcessor};
