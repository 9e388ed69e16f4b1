//! 源文档缓存 - 业务能力层
//!
//! 同一时间最多持有一个打开的源文档。清单里同一源文档的行通常连在一起，
//! 连续的行共用一次打开；源文档标识变化时关闭旧的、打开新的。

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::RowError;
use crate::infrastructure::DocumentStore;

/// 源文档缓存
///
/// 由批处理层持有，生命周期覆盖整个批次。
pub struct SourceCache<D> {
    current: Option<(String, D)>,
    /// 打开失败的源文档，本批次内不再重试
    failed_sources: HashSet<String>,
}

impl<D> SourceCache<D> {
    pub fn new() -> Self {
        Self {
            current: None,
            failed_sources: HashSet::new(),
        }
    }

    /// 当前持有的源文档标识
    pub fn current_source_id(&self) -> Option<&str> {
        self.current.as_ref().map(|(source_id, _)| source_id.as_str())
    }

    /// 确保 `source_id` 对应的文档处于打开状态并返回它
    ///
    /// # 参数
    /// - `store`: 文档存储
    /// - `source_id`: 源文档标识（缓存键）
    /// - `path`: 源文档路径
    pub fn ensure_open<S>(
        &mut self,
        store: &mut S,
        source_id: &str,
        path: &Path,
    ) -> Result<&D, RowError>
    where
        S: DocumentStore<Document = D>,
    {
        if self.current_source_id() != Some(source_id) {
            if self.failed_sources.contains(source_id) {
                return Err(RowError::SourceUnavailable {
                    source_id: source_id.to_string(),
                });
            }

            self.release(store);

            info!("📂 打开源文档: {}", path.display());
            let document = store.open(path).map_err(|source| {
                self.failed_sources.insert(source_id.to_string());
                RowError::SourceAccess {
                    source_id: source_id.to_string(),
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            self.current = Some((source_id.to_string(), document));
        }

        match &self.current {
            Some((_, document)) => Ok(document),
            None => Err(RowError::SourceUnavailable {
                source_id: source_id.to_string(),
            }),
        }
    }

    /// 关闭当前持有的文档（如果有）
    pub fn release<S>(&mut self, store: &mut S)
    where
        S: DocumentStore<Document = D>,
    {
        if let Some((source_id, document)) = self.current.take() {
            debug!("关闭源文档: {}", source_id);
            store.close(document);
        }
    }
}

impl<D> Default for SourceCache<D> {
    fn default() -> Self {
        Self::new()
    }
}
