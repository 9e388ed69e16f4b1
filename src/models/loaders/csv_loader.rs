use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tokio::fs;

use crate::error::ManifestError;
use crate::models::manifest_row::{ManifestRow, RawManifestRecord, MANIFEST_FIELD_COUNT};

/// 从 CSV 文件加载清单，只保留有效（Y）的行
pub async fn load_manifest(manifest_path: &Path) -> Result<Vec<ManifestRow>, ManifestError> {
    let content = fs::read_to_string(manifest_path)
        .await
        .map_err(|source| ManifestError::Read {
            path: manifest_path.to_path_buf(),
            source,
        })?;

    tracing::info!("正在加载清单: {}", manifest_path.display());
    let rows = parse_manifest(&content)?;
    tracing::info!("成功加载 {} 行有效指令", rows.len());

    Ok(rows)
}

/// 解析清单文本
///
/// 第一个字段不是 Y 的行（包括表头）直接跳过，不做校验；
/// 有效行必须恰好有 7 个字段，否则整个清单加载失败。
pub fn parse_manifest(content: &str) -> Result<Vec<ManifestRow>, ManifestError> {
    // Excel 导出的 UTF-8 CSV 带 BOM，会让第一行的 Y 失效
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ManifestError::Csv { source })?;
        let line = record_line(&record, index);

        let active = record.get(0).is_some_and(ManifestRow::is_active_marker);
        if !active {
            tracing::debug!("跳过第 {} 行（未启用）", line);
            continue;
        }

        if record.len() != MANIFEST_FIELD_COUNT {
            return Err(ManifestError::FieldCount {
                line,
                expected: MANIFEST_FIELD_COUNT,
                actual: record.len(),
            });
        }

        let raw: RawManifestRecord = record
            .deserialize(None)
            .map_err(|source| ManifestError::Csv { source })?;
        rows.push(ManifestRow::from_record(line, raw)?);
    }

    Ok(rows)
}

fn record_line(record: &StringRecord, index: usize) -> u64 {
    record
        .position()
        .map(|position| position.line())
        .unwrap_or(index as u64 + 1)
}
