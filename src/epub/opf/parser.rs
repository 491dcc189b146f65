//! OPF解析器模块
//!
//! 把OPF文件还原为 [`Publication`]。

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::manifest::ManifestItem;
use crate::epub::opf::publication::{Creator, DEFAULT_LANGUAGE, Publication};
use crate::epub::opf::spine::SpineItem;

/// 标识符前缀，生成OPF时添加、解析时去除
const UUID_PREFIX: &str = "urn:uuid:";

/// 解析过程中的dc:identifier
#[derive(Debug)]
struct ParsedIdentifier {
    id: Option<String>,
    value: String,
}

impl Publication {
    /// 从OPF文件路径解析出版物
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Publication> {
        let content = fs::read_to_string(path)?;
        Self::parse_xml(&content)
    }

    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Publication, EpubError>` - 缺少标题或标识符时返回错误
    pub fn parse_xml(xml_content: &str) -> Result<Publication> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut unique_identifier = None;
        let mut title = None;
        let mut language = None;
        let mut authors = Vec::new();
        let mut identifiers: Vec<ParsedIdentifier> = Vec::new();
        let mut items = Vec::new();
        let mut spine = Vec::new();

        let mut buf = Vec::new();
        let mut current_section = String::new();
        let mut text_content = String::new();
        // 当前dc:creator的 (file-as, role)
        let mut current_creator: Option<(Option<String>, Option<String>)> = None;
        let mut current_identifier_id: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "package" => {
                            unique_identifier = Self::parse_attribute(e, b"unique-identifier")?;
                        }
                        "metadata" | "manifest" | "spine" => {
                            current_section = local_name.to_string();
                        }
                        "creator" if current_section == "metadata" => {
                            current_creator = Some((
                                Self::parse_attribute(e, b"file-as")?,
                                Self::parse_attribute(e, b"role")?,
                            ));
                        }
                        "identifier" if current_section == "metadata" => {
                            current_identifier_id = Self::parse_attribute(e, b"id")?;
                        }
                        "item" if current_section == "manifest" => {
                            items.push(Self::parse_manifest_item(e)?);
                        }
                        "itemref" if current_section == "spine" => {
                            let idref = Self::parse_attribute(e, b"idref")?
                                .ok_or_else(|| EpubError::OpfParseError("itemref缺少idref属性".to_string()))?;
                            let linear = Self::parse_attribute(e, b"linear")?;
                            spine.push(match linear.as_deref() {
                                Some("no") => SpineItem::new_non_linear(idref),
                                _ => SpineItem::new(idref),
                            });
                        }
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::End(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "metadata" | "manifest" | "spine" => {
                            current_section.clear();
                        }
                        "title" if current_section == "metadata" && title.is_none() => {
                            title = Some(text_content.trim().to_string());
                        }
                        "language" if current_section == "metadata" && language.is_none() => {
                            language = Some(text_content.trim().to_string());
                        }
                        "creator" if current_section == "metadata" => {
                            if let Some((file_as, role)) = current_creator.take() {
                                // 只收集作者，其他角色（编辑、插图等）忽略
                                if role.as_deref().is_none_or(|role| role == "aut") {
                                    authors.push(Creator::new(text_content.trim(), file_as));
                                }
                            }
                        }
                        "identifier" if current_section == "metadata" => {
                            identifiers.push(ParsedIdentifier {
                                id: current_identifier_id.take(),
                                value: text_content.trim().to_string(),
                            });
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let title = title.ok_or_else(|| EpubError::OpfParseError("缺少dc:title".to_string()))?;

        let identifier = identifiers
            .iter()
            .find(|identifier| identifier.id.is_some() && identifier.id == unique_identifier)
            .or_else(|| identifiers.first())
            .ok_or_else(|| EpubError::OpfParseError("缺少dc:identifier".to_string()))?;
        let unique_id = identifier
            .value
            .strip_prefix(UUID_PREFIX)
            .unwrap_or(&identifier.value)
            .to_string();

        let mut publication = Publication::new(unique_id, title);
        publication.authors = authors;
        publication.language = language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        for item in items {
            publication
                .add_item(item.spine(false))
                .map_err(|e| EpubError::OpfParseError(e.to_string()))?;
        }
        for spine_item in spine {
            publication
                .push_spine_item(spine_item)
                .map_err(|e| EpubError::OpfParseError(e.to_string()))?;
        }

        Ok(publication)
    }

    /// 读取单个属性值
    fn parse_attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
        for attr_result in e.attributes() {
            let attr = attr_result?;
            if attr.key.local_name().as_ref() == name {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    /// 解析manifest中的item元素
    fn parse_manifest_item(e: &BytesStart) -> Result<crate::epub::opf::ManifestItemBuilder> {
        let id = Self::parse_attribute(e, b"id")?;
        let href = Self::parse_attribute(e, b"href")?
            .ok_or_else(|| EpubError::OpfParseError("item缺少href属性".to_string()))?;
        let media_type = Self::parse_attribute(e, b"media-type")?;

        let mut item = ManifestItem::builder(href);
        if let Some(id) = id {
            item = item.id(id);
        }
        if let Some(media_type) = media_type {
            item = item.media_type(media_type);
        }
        Ok(item)
    }
}
