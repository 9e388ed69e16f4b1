//! 输出路由 - 业务能力层
//!
//! 根据 `output_id` 的前缀决定输出目录，按需创建目录并保存文档。

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::{DocumentError, RowError};
use crate::infrastructure::DocumentStore;
use crate::services::archive_layout::ArchiveLayout;

/// 输出路由
#[derive(Debug, Clone)]
pub struct OutputRouter {
    layout: ArchiveLayout,
}

impl OutputRouter {
    pub fn new(layout: ArchiveLayout) -> Self {
        Self { layout }
    }

    /// 保存文档到 `<archive_root>/<前缀>/<output_id>.<ext>`，同名文件直接覆盖
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub fn route_and_save<S: DocumentStore>(
        &self,
        store: &mut S,
        output_id: &str,
        document: S::Document,
    ) -> Result<PathBuf, RowError> {
        let folder = self.layout.output_folder(output_id);
        fs::create_dir_all(&folder).map_err(|source| RowError::OutputWrite {
            output_id: output_id.to_string(),
            path: folder.clone(),
            source: DocumentError::Io {
                path: folder.clone(),
                source,
            },
        })?;

        let path = self.layout.output_path(output_id);
        store
            .save(document, &path)
            .map_err(|source| RowError::OutputWrite {
                output_id: output_id.to_string(),
                path: path.clone(),
                source,
            })?;

        info!("💾 已保存: {}", path.display());
        Ok(path)
    }
}
