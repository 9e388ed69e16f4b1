//! 文档组装 - 业务能力层
//!
//! 按解析出的区间顺序，从源文档复制页面到新文档，
//! 然后按需在最前面插入标签页、在最后追加空白标记页。
//! 只返回内存中的文档，保存由输出路由负责。

use tracing::info;

use crate::config::Config;
use crate::error::AssembleError;
use crate::infrastructure::{
    DocumentStore, LabelPlacement, PageContainer, PageLabel, PagePosition, DEFAULT_PAGE_SIZE,
};
use crate::models::{PageSpan, Rotation};

/// 一次组装请求
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    /// 输出文档标识，同时也是标签页上的文字
    pub output_id: &'a str,
    pub insert_front_label: bool,
    pub insert_end_blank: bool,
    /// 复制时附加的旋转，`None` 表示保持原样
    pub rotation: Option<Rotation>,
}

/// 文档组装器
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    label_font_size: f32,
    blank_marker: PageLabel,
}

impl DocumentAssembler {
    pub fn new(label_font_size: f32, blank_marker_text: impl Into<String>, blank_font_size: f32) -> Self {
        Self {
            label_font_size,
            blank_marker: PageLabel {
                text: blank_marker_text.into(),
                font_size: blank_font_size,
                placement: LabelPlacement::Top,
            },
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.label_font_size,
            config.blank_marker_text.clone(),
            config.blank_font_size,
        )
    }

    /// 组装输出文档
    ///
    /// 所有区间先做越界检查，任何一个越界都不会产生输出。
    ///
    /// # 参数
    /// - `store`: 用来新建输出文档
    /// - `source`: 已打开的源文档
    /// - `spans`: 解析后的区间，顺序即输出顺序
    /// - `request`: 标签页 / 空白页 / 旋转选项
    pub fn assemble<S: DocumentStore>(
        &self,
        store: &mut S,
        source: &S::Document,
        spans: &[PageSpan],
        request: &AssemblyRequest<'_>,
    ) -> Result<S::Document, AssembleError> {
        let page_count = source.page_count();
        if let Some(span) = spans
            .iter()
            .find(|span| span.from == 0 || span.from > span.to || span.to > page_count)
        {
            return Err(AssembleError::OutOfBounds {
                span: *span,
                page_count,
            });
        }

        let mut output = store.create();
        for span in spans {
            output.copy_range_from(source, *span, request.rotation)?;
            info!("✅ {}: 第 {} 页已抽取", request.output_id, span);
        }

        // 辅助页与第一页内容页同尺寸
        let size = output.page_size(1).unwrap_or(DEFAULT_PAGE_SIZE);

        if request.insert_front_label {
            let label = PageLabel {
                text: request.output_id.to_string(),
                font_size: self.label_font_size,
                placement: LabelPlacement::LowerHalf,
            };
            output.insert_labeled_page(PagePosition::Front, &label, size)?;
        }

        if request.insert_end_blank {
            output.insert_labeled_page(PagePosition::Back, &self.blank_marker, size)?;
        }

        Ok(output)
    }
}
