use serde::Deserialize;

use crate::error::ManifestError;

/// 清单中每行的字段数
pub const MANIFEST_FIELD_COUNT: usize = 7;

/// 页面旋转角度（顺时针）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// 只认 "90" / "180" / "270"，其它值都视为不旋转
    pub fn from_manifest(value: &str) -> Option<Self> {
        match value.trim() {
            "90" => Some(Rotation::Deg90),
            "180" => Some(Rotation::Deg180),
            "270" => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

/// CSV 中的原始记录（字段顺序即列顺序）
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifestRecord {
    pub active: String,
    pub source_id: String,
    pub output_id: String,
    pub range_expr: String,
    pub insert_front_label: String,
    pub insert_end_blank: String,
    pub rotation: String,
}

/// 清单中的一行：生成一个输出文档的指令
///
/// 加载时校验一次，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// 是否参与本次批处理
    pub active: bool,
    /// 源文档标识（对应 `Original/<source_id>.pdf`）
    pub source_id: String,
    /// 输出文档标识，第一个 `-` 之前的部分决定输出目录
    pub output_id: String,
    /// 原始页码范围表达式（从 1 开始，闭区间）
    pub range_expr: String,
    /// 是否在最前面插入写有 `output_id` 的标签页
    pub insert_front_label: bool,
    /// 是否在最后追加空白标记页
    pub insert_end_blank: bool,
    /// 旋转（保留字段，默认不生效）
    pub rotation: String,
}

impl ManifestRow {
    /// 第一个字段是否为 Y（不区分大小写）
    pub fn is_active_marker(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("y")
    }

    /// 从原始记录构造并校验
    ///
    /// # 参数
    /// - `line`: CSV 中的行号（用于错误信息）
    /// - `raw`: 原始记录
    pub fn from_record(line: u64, raw: RawManifestRecord) -> Result<Self, ManifestError> {
        let source_id = required(line, "source_id", raw.source_id)?;
        let output_id = required(line, "output_id", raw.output_id)?;
        let range_expr = required(line, "range_expr", raw.range_expr)?;

        Ok(Self {
            active: Self::is_active_marker(&raw.active),
            source_id,
            output_id,
            range_expr,
            insert_front_label: parse_flag(line, "insert_front_label", &raw.insert_front_label)?,
            insert_end_blank: parse_flag(line, "insert_end_blank", &raw.insert_end_blank)?,
            rotation: raw.rotation.trim().to_string(),
        })
    }

    /// 清单中请求的旋转角度（是否应用由配置决定）
    pub fn requested_rotation(&self) -> Option<Rotation> {
        Rotation::from_manifest(&self.rotation)
    }
}

fn required(line: u64, field: &'static str, value: String) -> Result<String, ManifestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ManifestError::EmptyField { line, field });
    }
    Ok(trimmed.to_string())
}

/// Y/N 字段，空值视为 N
fn parse_flag(line: u64, field: &'static str, value: &str) -> Result<bool, ManifestError> {
    match value.trim() {
        "Y" | "y" => Ok(true),
        "N" | "n" | "" => Ok(false),
        other => Err(ManifestError::InvalidFlag {
            line,
            field,
            value: other.to_string(),
        }),
    }
}
