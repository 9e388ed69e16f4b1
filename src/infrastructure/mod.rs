//! 基础设施层：持有文档资源，只暴露页面容器能力

pub mod lopdf_store;
pub mod page_container;

pub use lopdf_store::{LopdfStore, PdfDocument};
pub use page_container::{
    DocumentStore, LabelPlacement, PageContainer, PageLabel, PagePosition, PageSize,
    DEFAULT_PAGE_SIZE,
};
