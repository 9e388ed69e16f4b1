use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件 → 环境变量 → 命令行参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 归档根目录，输出目录都建在这里
    pub archive_root: PathBuf,
    /// 源文档所在的子目录
    pub source_folder: String,
    /// 清单所在目录（`data_<variant>.csv`）
    pub manifest_folder: PathBuf,
    /// 未指定清单变体时使用的清单
    pub default_manifest: PathBuf,
    /// 源文档和输出文档的扩展名
    pub document_extension: String,
    /// 标签页字号
    pub label_font_size: f32,
    /// 空白标记页字号
    pub blank_font_size: f32,
    /// 空白标记页上的文字
    pub blank_marker_text: String,
    /// 是否应用清单中的旋转字段
    pub apply_rotation: bool,
    /// 某一行失败后是否继续处理后续行
    pub continue_on_error: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 失败记录文件
    pub failure_log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("."),
            source_folder: "Original".to_string(),
            manifest_folder: PathBuf::from("page_data"),
            default_manifest: PathBuf::from("data.csv"),
            document_extension: "pdf".to_string(),
            label_font_size: 25.0,
            blank_font_size: 14.0,
            blank_marker_text: "空白ページ".to_string(),
            apply_rotation: false,
            continue_on_error: false,
            verbose_logging: false,
            failure_log_file: PathBuf::from("failed_rows.txt"),
        }
    }
}

impl Config {
    /// 读取 TOML 配置文件，缺少的键使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            archive_root: env_or("ARCHIVE_ROOT", self.archive_root)?,
            source_folder: env_or("SOURCE_FOLDER", self.source_folder)?,
            manifest_folder: env_or("MANIFEST_FOLDER", self.manifest_folder)?,
            default_manifest: env_or("DEFAULT_MANIFEST", self.default_manifest)?,
            document_extension: env_or("DOCUMENT_EXTENSION", self.document_extension)?,
            label_font_size: env_or("LABEL_FONT_SIZE", self.label_font_size)?,
            blank_font_size: env_or("BLANK_FONT_SIZE", self.blank_font_size)?,
            blank_marker_text: env_or("BLANK_MARKER_TEXT", self.blank_marker_text)?,
            apply_rotation: env_or("APPLY_ROTATION", self.apply_rotation)?,
            continue_on_error: env_or("CONTINUE_ON_ERROR", self.continue_on_error)?,
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging)?,
            failure_log_file: env_or("FAILURE_LOG_FILE", self.failure_log_file)?,
        })
    }

    /// 清单文件路径
    ///
    /// `variant` 为 `Some("x")` 时是 `<manifest_folder>/data_x.csv`，否则是默认清单。
    pub fn manifest_path(&self, variant: Option<&str>) -> PathBuf {
        match variant {
            Some(variant) => self.manifest_folder.join(format!("data_{variant}.csv")),
            None => self.default_manifest.clone(),
        }
    }
}

fn env_or<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}
