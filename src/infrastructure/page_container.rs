//! 页面容器能力 - 基础设施层
//!
//! 上层只通过这两个 trait 操作文档：打开、新建、保存、复制页面、插入文字页。
//! 具体的 PDF 编解码由实现者负责。

use std::path::Path;

use crate::error::DocumentError;
use crate::models::{PageSpan, Rotation};

/// A4 纵向，单位 pt
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width: 595.0,
    height: 842.0,
};

/// 页面尺寸（pt）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// 插入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePosition {
    Front,
    Back,
}

/// 文字在页面上的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    /// 水平居中，第一行位于页面下半部分的顶端
    LowerHalf,
    /// 水平居中，第一行位于页面顶端
    Top,
}

/// 只包含一行文字的辅助页
#[derive(Debug, Clone, PartialEq)]
pub struct PageLabel {
    pub text: String,
    pub font_size: f32,
    pub placement: LabelPlacement,
}

/// 一个打开的文档
pub trait PageContainer {
    /// 页数
    fn page_count(&self) -> u32;

    /// 第 `page` 页（从 1 开始）的尺寸
    fn page_size(&self, page: u32) -> Option<PageSize>;

    /// 把 `source` 的 `[span.from, span.to]` 按升序追加到本文档末尾
    ///
    /// `rotation` 为 `Some` 时在原有旋转基础上再顺时针旋转。
    fn copy_range_from(
        &mut self,
        source: &Self,
        span: PageSpan,
        rotation: Option<Rotation>,
    ) -> Result<(), DocumentError>;

    /// 插入一页只写有 `label` 的页面
    fn insert_labeled_page(
        &mut self,
        position: PagePosition,
        label: &PageLabel,
        size: PageSize,
    ) -> Result<(), DocumentError>;
}

/// 文档的打开、新建与持久化
pub trait DocumentStore {
    type Document: PageContainer;

    /// 打开已有文档
    fn open(&mut self, path: &Path) -> Result<Self::Document, DocumentError>;

    /// 新建空文档
    fn create(&mut self) -> Self::Document;

    /// 保存文档（覆盖同名文件），保存后文档即被消费
    fn save(&mut self, document: Self::Document, path: &Path) -> Result<(), DocumentError>;

    /// 关闭文档
    fn close(&mut self, document: Self::Document) {
        drop(document);
    }
}
