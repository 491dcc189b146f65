//! 出版物模块
//!
//! 维护OPF包文件中的元数据、清单和脊柱，并负责生成OPF文件。

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::epub::error::{EpubError, Result};
use crate::epub::id::random_id;
use crate::epub::opf::manifest::{ManifestItem, ManifestItemBuilder};
use crate::epub::opf::spine::SpineItem;

/// OPF命名空间
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";

/// Dublin Core命名空间
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// 唯一标识符元素的ID
pub const UNIQUE_IDENTIFIER_ID: &str = "bookid";

/// 脊柱引用的NCX清单项ID
pub const NCX_ITEM_ID: &str = "ncx";

/// 默认语言
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// 作者信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    /// 作者姓名
    pub name: String,
    /// 排序用名称（opf:file-as）
    pub file_as: Option<String>,
}

impl Creator {
    /// 创建作者信息
    pub fn new(name: impl Into<String>, file_as: Option<String>) -> Self {
        Self {
            name: name.into(),
            file_as,
        }
    }
}

/// 一个出版物，对应一个OPF文件
///
/// 出版物的所有文件（包括图片、CSS等）都必须列在清单中；
/// 脊柱按线性阅读顺序引用其中的内容文档。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// 唯一标识符
    pub unique_id: String,
    /// 标题
    pub title: String,
    /// 作者列表
    pub authors: Vec<Creator>,
    /// 语言
    pub language: String,
    /// 清单项
    items: Vec<ManifestItem>,
    /// 脊柱
    spine: Vec<SpineItem>,
}

impl Publication {
    /// 创建新的出版物
    pub fn new(unique_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            title: title.into(),
            authors: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            items: Vec::new(),
            spine: Vec::new(),
        }
    }

    /// 添加作者
    pub fn add_author(&mut self, name: impl Into<String>, file_as: Option<String>) {
        self.authors.push(Creator::new(name, file_as));
    }

    /// 所有清单项
    pub fn items(&self) -> &[ManifestItem] {
        &self.items
    }

    /// 脊柱项
    pub fn spine(&self) -> &[SpineItem] {
        &self.spine
    }

    /// 清单中所有项目的ID
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    /// 按阅读顺序返回脊柱引用的清单项
    pub fn spine_items(&self) -> Vec<&ManifestItem> {
        self.spine
            .iter()
            .filter_map(|spine_item| self.get_item(&spine_item.idref))
            .collect()
    }

    /// 根据ID获取清单项
    pub fn get_item(&self, item_id: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// 清单中是否已有该ID
    pub fn contains_item(&self, item_id: &str) -> bool {
        self.get_item(item_id).is_some()
    }

    /// 生成一个清单中尚未使用的随机ID
    pub fn generate_id(&self) -> String {
        loop {
            let item_id = random_id();
            if !self.contains_item(&item_id) {
                return item_id;
            }
        }
    }

    /// 向清单添加一个项目，返回其ID
    ///
    /// 未指定ID时自动生成；内容文档默认同时加入脊柱。
    /// ID重复、媒体类型未知或非内容文档要求加入脊柱时返回错误。
    pub fn add_item(&mut self, item: ManifestItemBuilder) -> Result<String> {
        let (item, spine) = item.resolve(|| self.generate_id())?;
        if self.contains_item(&item.id) {
            return Err(EpubError::ManifestError(format!("ID为 '{}' 的清单项已存在", item.id)));
        }

        let item_id = item.id.clone();
        self.items.push(item);
        if spine {
            self.spine.push(SpineItem::new(item_id.clone()));
        }

        Ok(item_id)
    }

    /// 把已有的清单项追加到脊柱末尾
    pub fn append_to_spine(&mut self, item_id: &str) -> Result<()> {
        self.push_spine_item(SpineItem::new(item_id))
    }

    /// 追加脊柱项，引用的清单项必须存在
    pub(crate) fn push_spine_item(&mut self, spine_item: SpineItem) -> Result<()> {
        if !self.contains_item(&spine_item.idref) {
            return Err(EpubError::ManifestError(format!(
                "脊柱引用了不存在的清单项 '{}'",
                spine_item.idref
            )));
        }
        self.spine.push(spine_item);
        Ok(())
    }

    /// 生成OPF文件内容
    pub fn to_opf(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut package = BytesStart::new("opf:package");
        package.push_attribute(("version", "2.0"));
        package.push_attribute(("xmlns:opf", OPF_NAMESPACE));
        package.push_attribute(("unique-identifier", UNIQUE_IDENTIFIER_ID));
        writer.write_event(Event::Start(package))?;

        let mut metadata = BytesStart::new("opf:metadata");
        metadata.push_attribute(("xmlns:dc", DC_NAMESPACE));
        writer.write_event(Event::Start(metadata))?;

        write_text(&mut writer, BytesStart::new("dc:title"), &self.title)?;
        for author in &self.authors {
            let mut creator = BytesStart::new("dc:creator");
            if let Some(file_as) = &author.file_as {
                creator.push_attribute(("opf:file-as", file_as.as_str()));
            }
            creator.push_attribute(("opf:role", "aut"));
            write_text(&mut writer, creator, &author.name)?;
        }

        let mut identifier = BytesStart::new("dc:identifier");
        identifier.push_attribute(("id", UNIQUE_IDENTIFIER_ID));
        write_text(&mut writer, identifier, &format!("urn:uuid:{}", self.unique_id))?;
        write_text(&mut writer, BytesStart::new("dc:language"), &self.language)?;

        writer.write_event(Event::End(BytesEnd::new("opf:metadata")))?;

        writer.write_event(Event::Start(BytesStart::new("opf:manifest")))?;
        for item in &self.items {
            let mut element = BytesStart::new("opf:item");
            element.push_attribute(("id", item.id.as_str()));
            element.push_attribute(("href", item.href.as_str()));
            element.push_attribute(("media-type", item.media_type.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("opf:manifest")))?;

        let mut spine = BytesStart::new("opf:spine");
        spine.push_attribute(("toc", NCX_ITEM_ID));
        writer.write_event(Event::Start(spine))?;
        for spine_item in &self.spine {
            let mut itemref = BytesStart::new("opf:itemref");
            itemref.push_attribute(("idref", spine_item.idref.as_str()));
            if !spine_item.linear {
                itemref.push_attribute(("linear", "no"));
            }
            writer.write_event(Event::Empty(itemref))?;
        }
        writer.write_event(Event::End(BytesEnd::new("opf:spine")))?;

        writer.write_event(Event::End(BytesEnd::new("opf:package")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// 写出只包含文本的元素
fn write_text<W: std::io::Write>(writer: &mut Writer<W>, start: BytesStart, text: &str) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_publication() -> Publication {
        let mut publication = Publication::new("unique-id", "The Sedan Chair");
        publication.add_author("Mark Smith", Some("Smith, Mark".to_string()));
        publication.language = "en-GB".to_string();
        publication
    }

    #[test]
    fn test_add_items() {
        let mut publication = sample_publication();
        let page_id = publication.add_item(ManifestItem::builder("index.html")).unwrap();
        let cover_id = publication.add_item(ManifestItem::builder("cover.jpg").id("cover")).unwrap();

        assert_eq!(page_id.len(), 8);
        assert_eq!(cover_id, "cover");
        assert_eq!(publication.item_ids(), [page_id.as_str(), "cover"]);

        // 只有内容文档进入脊柱
        let spine: Vec<&str> = publication.spine_items().iter().map(|i| i.href.as_str()).collect();
        assert_eq!(spine, ["index.html"]);
    }

    #[test]
    fn test_mime_exception() {
        let mut publication = sample_publication();
        let err = publication
            .add_item(ManifestItem::builder("cover.jpg").spine(true))
            .unwrap_err();
        assert!(matches!(err, EpubError::ManifestError(_)));
        assert!(publication.items().is_empty());
    }

    #[test]
    fn test_duplicate_item_id() {
        let mut publication = sample_publication();
        publication.add_item(ManifestItem::builder("a.html").id("page")).unwrap();
        let err = publication
            .add_item(ManifestItem::builder("b.html").id("page"))
            .unwrap_err();
        assert!(matches!(err, EpubError::ManifestError(ref msg) if msg.contains("page")));
        assert_eq!(publication.items().len(), 1);
        assert_eq!(publication.spine().len(), 1);
    }

    #[test]
    fn test_append_to_spine() {
        let mut publication = sample_publication();
        publication
            .add_item(ManifestItem::builder("notes.html").id("notes").spine(false))
            .unwrap();
        assert!(publication.spine().is_empty());

        publication.append_to_spine("notes").unwrap();
        assert_eq!(publication.spine(), [SpineItem::new("notes")]);
        assert!(publication.append_to_spine("missing").is_err());
    }

    #[test]
    fn test_generate_id_is_unused() {
        let mut publication = sample_publication();
        let id = publication.add_item(ManifestItem::builder("a.html")).unwrap();
        assert_ne!(publication.generate_id(), id);
    }

    #[test]
    fn test_opf_output() {
        let mut publication = sample_publication();
        publication.add_item(ManifestItem::builder("index.html").id("page_1")).unwrap();
        publication.add_item(ManifestItem::builder("cover.jpg").id("cover")).unwrap();

        let opf = publication.to_opf().unwrap();
        assert!(opf.contains(r#"<opf:package version="2.0" xmlns:opf="http://www.idpf.org/2007/opf" unique-identifier="bookid">"#));
        assert!(opf.contains("<dc:title>The Sedan Chair</dc:title>"));
        assert!(opf.contains(r#"<dc:creator opf:file-as="Smith, Mark" opf:role="aut">Mark Smith</dc:creator>"#));
        assert!(opf.contains(r#"<dc:identifier id="bookid">urn:uuid:unique-id</dc:identifier>"#));
        assert!(opf.contains("<dc:language>en-GB</dc:language>"));
        assert!(opf.contains(r#"<opf:item id="cover" href="cover.jpg" media-type="image/jpeg"/>"#));
        assert!(opf.contains(r#"<opf:spine toc="ncx">"#));
        assert!(opf.contains(r#"<opf:itemref idref="page_1"/>"#));
        assert!(!opf.contains(r#"idref="cover""#));
    }

    #[test]
    fn test_opf_escapes_metadata() {
        let mut publication = Publication::new("id", "Cats & <Dogs>");
        publication.add_author("A \"Quoted\" Name", None);
        let opf = publication.to_opf().unwrap();
        assert!(opf.contains("Cats &amp; &lt;Dogs&gt;"));
        assert!(!opf.contains("file-as"));
    }
}
