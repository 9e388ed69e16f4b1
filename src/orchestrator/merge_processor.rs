//! 合并处理器 - 编排层
//!
//! 把若干个文档的全部页面按参数顺序拼接成一个文档。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{AppResult, DocumentError};
use crate::infrastructure::{DocumentStore, PageContainer};
use crate::models::PageSpan;

/// 合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub output_path: PathBuf,
    pub page_count: u32,
    /// 没有页面而被跳过的输入
    pub skipped_inputs: Vec<PathBuf>,
}

/// 合并处理器
pub struct MergeProcessor<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> MergeProcessor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 合并 `inputs` 到 `output`，同名文件直接覆盖
    pub fn merge(&mut self, inputs: &[PathBuf], output: &Path) -> AppResult<MergeOutcome> {
        let mut merged = self.store.create();
        let mut skipped_inputs = Vec::new();

        for input in inputs {
            let document = self.store.open(input)?;
            let page_count = document.page_count();

            if page_count == 0 {
                warn!("⚠️ {} 没有页面，跳过", input.display());
                skipped_inputs.push(input.clone());
                self.store.close(document);
                continue;
            }

            let copied = merged.copy_range_from(
                &document,
                PageSpan {
                    from: 1,
                    to: page_count,
                },
                None,
            );
            self.store.close(document);
            copied?;
            info!("✅ 已合并 {} ({} 页)", input.display(), page_count);
        }

        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let page_count = merged.page_count();
        self.store.save(merged, output)?;
        info!("💾 已保存: {} (共 {} 页)", output.display(), page_count);

        Ok(MergeOutcome {
            output_path: output.to_path_buf(),
            page_count,
            skipped_inputs,
        })
    }
}
