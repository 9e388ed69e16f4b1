//! 归档目录布局
//!
//! ```text
//! <archive_root>/<source_folder>/<source_id>.<ext>      源文档
//! <archive_root>/<output_id 中第一个 '-' 之前>/<output_id>.<ext>   输出文档
//! ```

use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    archive_root: PathBuf,
    source_folder: String,
    extension: String,
}

impl ArchiveLayout {
    pub fn new(
        archive_root: impl Into<PathBuf>,
        source_folder: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            archive_root: archive_root.into(),
            source_folder: source_folder.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.archive_root.clone(),
            config.source_folder.clone(),
            config.document_extension.clone(),
        )
    }

    /// 源文档路径
    pub fn source_path(&self, source_id: &str) -> PathBuf {
        self.archive_root
            .join(&self.source_folder)
            .join(self.file_name(source_id))
    }

    /// 输出目录：`output_id` 中第一个 `-` 之前的部分，没有 `-` 时为整个 id
    pub fn output_folder(&self, output_id: &str) -> PathBuf {
        self.archive_root.join(output_prefix(output_id))
    }

    /// 输出文件路径
    pub fn output_path(&self, output_id: &str) -> PathBuf {
        self.output_folder(output_id).join(self.file_name(output_id))
    }

    fn file_name(&self, id: &str) -> String {
        format!("{}.{}", id, self.extension)
    }
}

/// `output_id` 中第一个 `-` 之前的部分
pub fn output_prefix(output_id: &str) -> &str {
    output_id
        .split_once('-')
        .map_or(output_id, |(prefix, _)| prefix)
}
