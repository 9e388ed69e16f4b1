//! 基于 lopdf 的页面容器 - 基础设施层
//!
//! 页面复制是对页面对象图的深拷贝：
//! - 继承自页面树的属性（Resources / MediaBox / CropBox / Rotate）会写到新页面上
//! - 同一个源对象只导入一次，多个页面共用字体、图片等资源
//! - 不会沿着引用回到源文档的页面树（/Parent、注释里的 /P、跳转目标等）

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::error::DocumentError;
use crate::infrastructure::page_container::{
    DocumentStore, LabelPlacement, PageContainer, PageLabel, PagePosition, PageSize,
};
use crate::models::{PageSpan, Rotation};

/// 可以从页面树继承的页面属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// 复制页面时不带过去的键
const SKIPPED_PAGE_KEYS: [&[u8]; 3] = [b"Parent", b"B", b"StructParents"];

/// 页面树最大深度，防止损坏文件里的循环引用
const MAX_TREE_DEPTH: usize = 64;

/// 标签文字左右各留出的边距（pt）
const LABEL_MARGIN: f32 = 36.0;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Helvetica 在 0x20..=0x7E 上的字宽（1/1000 em）
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// 标签页使用的字体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LabelFont {
    /// 标准 14 字体，只用于纯 ASCII 文本
    Helvetica,
    /// 预定义日文 CID 字体，不嵌入字形
    Japanese,
}

impl LabelFont {
    fn for_text(text: &str) -> Self {
        if text.is_ascii() {
            LabelFont::Helvetica
        } else {
            LabelFont::Japanese
        }
    }

    fn resource_name(self) -> &'static str {
        match self {
            LabelFont::Helvetica => "F1",
            LabelFont::Japanese => "F2",
        }
    }

    /// 估算文字宽度（pt），用于水平居中
    fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| match self {
                LabelFont::Helvetica => helvetica_width(c),
                LabelFont::Japanese if c.is_ascii() => 500,
                LabelFont::Japanese => 1000,
            })
            .sum();
        units as f32 * font_size / 1000.0
    }

    fn encode(self, text: &str) -> Object {
        match self {
            LabelFont::Helvetica => Object::string_literal(text),
            LabelFont::Japanese => {
                let bytes = text
                    .encode_utf16()
                    .flat_map(|unit| unit.to_be_bytes())
                    .collect();
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }
}

/// 文字超出页宽（扣除左右边距）时缩小字号，保证整行落在页面内
fn fitted_font_size(font: LabelFont, text: &str, font_size: f32, page_width: f32) -> f32 {
    let available = page_width - 2.0 * LABEL_MARGIN;
    let width = font.text_width(text, font_size);
    if available > 0.0 && width > available {
        font_size * available / width
    } else {
        font_size
    }
}

fn helvetica_width(c: char) -> u32 {
    match c as u32 {
        code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize] as u32,
        _ => 556,
    }
}

/// lopdf 文档
#[derive(Debug)]
pub struct PdfDocument {
    /// 进程内唯一编号，用来区分导入映射来自哪个源文档
    uid: u64,
    inner: Document,
    /// 页面树根节点
    pages_id: ObjectId,
    /// 按顺序排列的页面对象
    kids: Vec<ObjectId>,
    /// (源文档编号, 源对象) → 本文档中的对象
    imported: HashMap<(u64, ObjectId), ObjectId>,
    fonts: HashMap<LabelFont, ObjectId>,
}

impl PdfDocument {
    /// 新建空文档
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.7");
        let pages_id = inner.new_object_id();
        Self::from_parts(inner, pages_id, Vec::new())
    }

    /// 从内存中的 PDF 数据加载
    pub fn load_mem(bytes: &[u8], path: &Path) -> Result<Self, DocumentError> {
        let inner = Document::load_mem(bytes).map_err(|source| DocumentError::Pdf {
            path: path.to_path_buf(),
            source,
        })?;

        let kids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        let pages_id = inner
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Pages").ok())
            .and_then(|pages| pages.as_reference().ok());

        let document = match pages_id {
            Some(pages_id) => Self::from_parts(inner, pages_id, kids),
            None => {
                let mut inner = inner;
                let pages_id = inner.new_object_id();
                Self::from_parts(inner, pages_id, kids)
            }
        };
        Ok(document)
    }

    fn from_parts(inner: Document, pages_id: ObjectId, kids: Vec<ObjectId>) -> Self {
        Self {
            uid: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            inner,
            pages_id,
            kids,
            imported: HashMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// 底层 lopdf 文档（只读）
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// 序列化为 PDF 字节
    pub fn to_bytes(mut self) -> Result<Vec<u8>, DocumentError> {
        self.finalize_page_tree();
        self.inner.compress();

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|source| DocumentError::Encode {
                source: source.into(),
            })?;
        Ok(buffer)
    }

    fn page_id(&self, page: u32) -> Result<ObjectId, DocumentError> {
        page.checked_sub(1)
            .and_then(|index| self.kids.get(index as usize))
            .copied()
            .ok_or(DocumentError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    /// 沿 /Parent 向上查找可继承属性
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = self.inner.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value.clone());
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.inner.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.inner.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// 把 `source` 的一页深拷贝到本文档，返回新页面对象
    fn import_page(
        &mut self,
        source: &PdfDocument,
        page: u32,
        rotation: Option<Rotation>,
    ) -> Result<ObjectId, DocumentError> {
        let source_page_id = source.page_id(page)?;
        let source_page = source
            .inner
            .get_dictionary(source_page_id)
            .map_err(|_| DocumentError::MissingPage { page })?;

        let mut page_dict = Dictionary::new();
        for (key, value) in source_page.iter() {
            if SKIPPED_PAGE_KEYS.contains(&key.as_slice()) {
                continue;
            }
            let imported = self.import_object(source, value);
            page_dict.set(key.clone(), imported);
        }

        for key in INHERITABLE_KEYS {
            if page_dict.has(key) {
                continue;
            }
            if let Some(value) = source.inherited_attribute(source_page_id, key) {
                let imported = self.import_object(source, &value);
                page_dict.set(key.to_vec(), imported);
            }
        }

        if let Some(rotation) = rotation {
            let current = page_dict
                .get(b"Rotate")
                .ok()
                .and_then(|value| value.as_i64().ok())
                .unwrap_or(0);
            page_dict.set("Rotate", Object::Integer((current + rotation.degrees()).rem_euclid(360)));
        }

        page_dict.set("Type", "Page");
        page_dict.set("Parent", self.pages_id);
        Ok(self.inner.add_object(page_dict))
    }

    fn import_object(&mut self, source: &PdfDocument, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self
                .import_reference(source, *id)
                .map(Object::Reference)
                .unwrap_or(Object::Null),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.import_object(source, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(source, dict)),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dictionary(source, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_dictionary(&mut self, source: &PdfDocument, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            let imported = self.import_object(source, value);
            copy.set(key.clone(), imported);
        }
        copy
    }

    /// 导入被引用的对象；指向页面树的引用和悬空引用返回 `None`
    fn import_reference(&mut self, source: &PdfDocument, id: ObjectId) -> Option<ObjectId> {
        if let Some(existing) = self.imported.get(&(source.uid, id)) {
            return Some(*existing);
        }

        let object = source.inner.get_object(id).ok()?;
        if matches!(type_name(object), Some(b"Page") | Some(b"Pages")) {
            return None;
        }

        // 先占位再递归，处理循环引用
        let new_id = self.inner.new_object_id();
        self.imported.insert((source.uid, id), new_id);
        let copy = self.import_object(source, object);
        self.inner.objects.insert(new_id, copy);
        Some(new_id)
    }

    fn font_id(&mut self, font: LabelFont) -> ObjectId {
        if let Some(id) = self.fonts.get(&font) {
            return *id;
        }

        let id = match font {
            LabelFont::Helvetica => self.inner.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
            LabelFont::Japanese => {
                let descriptor_id = self.inner.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => "HeiseiKakuGo-W5",
                    "Flags" => Object::Integer(4),
                    "FontBBox" => vec![
                        Object::Integer(-92),
                        Object::Integer(-250),
                        Object::Integer(1010),
                        Object::Integer(922),
                    ],
                    "ItalicAngle" => Object::Integer(0),
                    "Ascent" => Object::Integer(752),
                    "Descent" => Object::Integer(-221),
                    "CapHeight" => Object::Integer(737),
                    "StemV" => Object::Integer(114),
                });
                let descendant_id = self.inner.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "CIDFontType0",
                    "BaseFont" => "HeiseiKakuGo-W5",
                    "CIDSystemInfo" => dictionary! {
                        "Registry" => Object::string_literal("Adobe"),
                        "Ordering" => Object::string_literal("Japan1"),
                        "Supplement" => Object::Integer(2),
                    },
                    "FontDescriptor" => descriptor_id,
                    "DW" => Object::Integer(1000),
                    "W" => vec![Object::Integer(1), Object::Integer(95), Object::Integer(500)],
                });
                self.inner.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type0",
                    "BaseFont" => "HeiseiKakuGo-W5-UniJIS-UCS2-HW-H",
                    "Encoding" => "UniJIS-UCS2-HW-H",
                    "DescendantFonts" => vec![Object::Reference(descendant_id)],
                })
            }
        };

        self.fonts.insert(font, id);
        id
    }

    /// 写入页面树和目录，保存前调用
    fn finalize_page_tree(&mut self) {
        let kids = self.kids.clone();
        for page_id in &kids {
            let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
                .iter()
                .filter_map(|key| {
                    self.inherited_attribute(*page_id, key)
                        .map(|value| (*key, value))
                })
                .collect();

            if let Ok(Object::Dictionary(page)) = self.inner.get_object_mut(*page_id) {
                for (key, value) in inherited {
                    if !page.has(key) {
                        page.set(key.to_vec(), value);
                    }
                }
                page.set("Parent", self.pages_id);
            }
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => Object::Integer(kids.len() as i64),
        };
        self.inner.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .ok()
            .and_then(|root| root.as_reference().ok());
        match catalog_id {
            Some(catalog_id) => {
                if let Ok(Object::Dictionary(catalog)) = self.inner.get_object_mut(catalog_id) {
                    catalog.set("Pages", self.pages_id);
                }
            }
            None => {
                let catalog_id = self.inner.add_object(dictionary! {
                    "Type" => "Catalog",
                    "Pages" => self.pages_id,
                });
                self.inner.trailer.set("Root", catalog_id);
            }
        }
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PageContainer for PdfDocument {
    fn page_count(&self) -> u32 {
        self.kids.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let page_id = self.page_id(page).ok()?;
        let boxed = self
            .inherited_attribute(page_id, b"CropBox")
            .or_else(|| self.inherited_attribute(page_id, b"MediaBox"))?;

        let Some(Object::Array(values)) = self.resolve(&boxed) else {
            return None;
        };
        let numbers: Vec<f32> = values
            .iter()
            .filter_map(|value| self.resolve(value).and_then(number))
            .collect();
        let &[llx, lly, urx, ury] = numbers.as_slice() else {
            return None;
        };

        let width = (urx - llx).abs();
        let height = (ury - lly).abs();
        let rotate = self
            .inherited_attribute(page_id, b"Rotate")
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0);

        if rotate.rem_euclid(180) == 90 {
            Some(PageSize {
                width: height,
                height: width,
            })
        } else {
            Some(PageSize { width, height })
        }
    }

    fn copy_range_from(
        &mut self,
        source: &Self,
        span: PageSpan,
        rotation: Option<Rotation>,
    ) -> Result<(), DocumentError> {
        let page_count = source.page_count();
        for page in [span.from, span.to] {
            if page == 0 || page > page_count {
                return Err(DocumentError::PageOutOfRange { page, page_count });
            }
        }

        for page in span.pages() {
            let page_id = self.import_page(source, page, rotation)?;
            self.kids.push(page_id);
        }
        debug!("已复制第 {} 页，共 {} 个导入对象", span, self.imported.len());
        Ok(())
    }

    fn insert_labeled_page(
        &mut self,
        position: PagePosition,
        label: &PageLabel,
        size: PageSize,
    ) -> Result<(), DocumentError> {
        let font = LabelFont::for_text(&label.text);
        let font_id = self.font_id(font);

        let font_size = fitted_font_size(font, &label.text, label.font_size, size.width);
        let text_width = font.text_width(&label.text, font_size);
        let x = ((size.width - text_width) / 2.0).max(0.0);
        let top = match label.placement {
            LabelPlacement::LowerHalf => size.height / 2.0,
            LabelPlacement::Top => size.height,
        };
        let baseline = top - font_size;

        let content = Content {
            operations: vec![
                Operation::new("g", vec![Object::Integer(0)]),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), Object::Real(font_size)],
                ),
                Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
                Operation::new("Tj", vec![font.encode(&label.text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|source| DocumentError::Encode { source })?;
        let content_id = self.inner.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width),
                Object::Real(size.height),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    font.resource_name() => font_id,
                },
            },
        });

        match position {
            PagePosition::Front => self.kids.insert(0, page_id),
            PagePosition::Back => self.kids.push(page_id),
        }
        Ok(())
    }
}

/// 直接读写文件系统的文档存储
#[derive(Debug, Default)]
pub struct LopdfStore;

impl LopdfStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for LopdfStore {
    type Document = PdfDocument;

    fn open(&mut self, path: &Path) -> Result<PdfDocument, DocumentError> {
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = PdfDocument::load_mem(&bytes, path)?;
        debug!("已打开 {} ({} 页)", path.display(), document.page_count());
        Ok(document)
    }

    fn create(&mut self) -> PdfDocument {
        PdfDocument::new()
    }

    fn save(&mut self, document: PdfDocument, path: &Path) -> Result<(), DocumentError> {
        let bytes = document.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    match dict.get(b"Type") {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}
