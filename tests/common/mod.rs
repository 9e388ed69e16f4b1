#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use archive_splicer::config::Config;
use archive_splicer::error::DocumentError;
use archive_splicer::infrastructure::{
    DocumentStore, LabelPlacement, PageContainer, PageLabel, PagePosition, PageSize,
};
use archive_splicer::models::{ManifestRow, PageSpan, Rotation};
use archive_splicer::services::ArchiveLayout;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const A4: PageSize = PageSize {
    width: 595.0,
    height: 842.0,
};

/// 假文档中的一页，记录它的来历
#[derive(Debug, Clone, PartialEq)]
pub enum FakePage {
    Source {
        source_id: String,
        page: u32,
        rotation: Option<Rotation>,
    },
    Label {
        text: String,
        placement: LabelPlacement,
        size: PageSize,
    },
}

impl FakePage {
    pub fn source(source_id: &str, page: u32) -> Self {
        FakePage::Source {
            source_id: source_id.to_string(),
            page,
            rotation: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub pages: Vec<FakePage>,
}

impl PageContainer for FakeDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let page = self.pages.get(page.checked_sub(1)? as usize)?;
        Some(match page {
            FakePage::Source { .. } => A4,
            FakePage::Label { size, .. } => *size,
        })
    }

    fn copy_range_from(
        &mut self,
        source: &Self,
        span: PageSpan,
        rotation: Option<Rotation>,
    ) -> Result<(), DocumentError> {
        for page in span.pages() {
            let copied = source
                .pages
                .get(page as usize - 1)
                .cloned()
                .ok_or(DocumentError::PageOutOfRange {
                    page,
                    page_count: source.page_count(),
                })?;
            let copied = match copied {
                FakePage::Source {
                    source_id, page, ..
                } => FakePage::Source {
                    source_id,
                    page,
                    rotation,
                },
                other => other,
            };
            self.pages.push(copied);
        }
        Ok(())
    }

    fn insert_labeled_page(
        &mut self,
        position: PagePosition,
        label: &PageLabel,
        size: PageSize,
    ) -> Result<(), DocumentError> {
        let page = FakePage::Label {
            text: label.text.clone(),
            placement: label.placement,
            size,
        };
        match position {
            PagePosition::Front => self.pages.insert(0, page),
            PagePosition::Back => self.pages.push(page),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Open(PathBuf),
    Close,
    Save(PathBuf),
}

/// 内存中的文档存储，记录每一次打开 / 关闭 / 保存
#[derive(Debug, Default)]
pub struct FakeStore {
    sources: HashMap<PathBuf, FakeDocument>,
    pub saved: HashMap<PathBuf, Vec<FakePage>>,
    pub events: Vec<StoreEvent>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个有 `pages` 页的源文档
    pub fn with_source(mut self, layout: &ArchiveLayout, source_id: &str, pages: u32) -> Self {
        let document = FakeDocument {
            pages: (1..=pages)
                .map(|page| FakePage::source(source_id, page))
                .collect(),
        };
        self.sources.insert(layout.source_path(source_id), document);
        self
    }

    pub fn opens(&self) -> Vec<&PathBuf> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StoreEvent::Open(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| **event == StoreEvent::Close)
            .count()
    }
}

impl DocumentStore for FakeStore {
    type Document = FakeDocument;

    fn open(&mut self, path: &Path) -> Result<FakeDocument, DocumentError> {
        self.events.push(StoreEvent::Open(path.to_path_buf()));
        self.sources
            .get(path)
            .cloned()
            .ok_or_else(|| DocumentError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such source"),
            })
    }

    fn create(&mut self) -> FakeDocument {
        FakeDocument::default()
    }

    fn save(&mut self, document: FakeDocument, path: &Path) -> Result<(), DocumentError> {
        self.events.push(StoreEvent::Save(path.to_path_buf()));
        self.saved.insert(path.to_path_buf(), document.pages);
        Ok(())
    }

    fn close(&mut self, _document: FakeDocument) {
        self.events.push(StoreEvent::Close);
    }
}

/// 归档根目录和失败记录都放在临时目录里的配置
pub fn test_config(root: &Path) -> Config {
    Config {
        archive_root: root.to_path_buf(),
        failure_log_file: root.join("failed_rows.txt"),
        ..Config::default()
    }
}

pub fn row(
    source_id: &str,
    output_id: &str,
    range_expr: &str,
    insert_front_label: bool,
    insert_end_blank: bool,
) -> ManifestRow {
    ManifestRow {
        active: true,
        source_id: source_id.to_string(),
        output_id: output_id.to_string(),
        range_expr: range_expr.to_string(),
        insert_front_label,
        insert_end_blank,
        rotation: String::new(),
    }
}

/// 写一个 `pages` 页的 PDF，每页写有 "Page N"
///
/// Resources 和 MediaBox 放在页面树根节点上，由页面继承。
pub fn write_numbered_pdf(path: &Path, pages: u32, size: PageSize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for page in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(600)]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {page}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(pages as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(size.width),
            Object::Real(size.height),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save test pdf");
}

/// 按顺序返回每页内容中 "Page N" 的 N；辅助页返回 `None`
pub fn page_numbers(path: &Path) -> Vec<Option<u32>> {
    let doc = Document::load(path).expect("load output pdf");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = doc.get_page_content(*page_id).expect("page content");
            let text = String::from_utf8_lossy(&content);
            text.split("(Page ")
                .nth(1)
                .and_then(|rest| rest.split(')').next())
                .and_then(|number| number.parse().ok())
        })
        .collect()
}

/// 每页解压后的内容流
pub fn page_contents(path: &Path) -> Vec<Vec<u8>> {
    let doc = Document::load(path).expect("load output pdf");
    doc.get_pages()
        .values()
        .map(|page_id| doc.get_page_content(*page_id).expect("page content"))
        .collect()
}
