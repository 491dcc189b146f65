//! NCX解析器模块
//!
//! 把NCX文件还原为 [`TableOfContents`]。输入中的 `playOrder` 与 `dtb:depth`
//! 不被信任，序列化时总是重新计算。

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::warn;

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::NavPoint;
use crate::epub::ncx::toc::TableOfContents;

/// 正在解析中的导航点
#[derive(Debug, Default)]
struct PendingNavPoint {
    id: Option<String>,
    class: Option<String>,
    label: Option<String>,
    link: Option<String>,
    children: Vec<NavPoint>,
}

impl PendingNavPoint {
    fn finish(self) -> Result<NavPoint> {
        let id = self
            .id
            .ok_or_else(|| EpubError::NcxParseError("navPoint缺少id属性".to_string()))?;
        let label = self
            .label
            .ok_or_else(|| EpubError::NcxParseError(format!("navPoint '{}' 缺少navLabel文本", id)))?;
        let link = self
            .link
            .ok_or_else(|| EpubError::NcxParseError(format!("navPoint '{}' 缺少content的src属性", id)))?;

        Ok(NavPoint {
            id,
            play_order: None,
            class: self.class,
            label,
            link,
            children: self.children,
        })
    }
}

impl TableOfContents {
    /// 从NCX文件路径解析目录
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TableOfContents> {
        let content = fs::read_to_string(path)?;
        Self::parse_xml(&content)
    }

    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<TableOfContents>` - 缺少 `dtb:uid`、`docTitle` 或 `navMap` 时返回错误
    pub fn parse_xml(xml_content: &str) -> Result<TableOfContents> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().expand_empty_elements = true;

        let mut unique_id = None;
        let mut stored_depth: Option<u32> = None;
        let mut title = None;
        let mut authors = Vec::new();
        let mut nav_points = Vec::new();
        let mut has_nav_map = false;

        let mut buf = Vec::new();
        // 当前所在的元素路径（本地名）
        let mut path: Vec<String> = Vec::new();
        let mut text_content = String::new();
        let mut nav_point_stack: Vec<PendingNavPoint> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

                    match local_name.as_str() {
                        "meta" if parent_is(&path, "head") => {
                            let (name, content) = Self::parse_meta_element(e)?;
                            match name.as_str() {
                                "dtb:uid" => unique_id = Some(content.trim().to_string()),
                                "dtb:depth" => stored_depth = content.trim().parse().ok(),
                                _ => {}
                            }
                        }
                        "navMap" if parent_is(&path, "ncx") => {
                            has_nav_map = true;
                        }
                        "navPoint" if inside(&path, "navMap") => {
                            nav_point_stack.push(Self::parse_nav_point_attributes(e)?);
                        }
                        "content" if parent_is(&path, "navPoint") => {
                            if let Some(current) = nav_point_stack.last_mut() {
                                current.link = Self::parse_content_src(e)?;
                            }
                        }
                        "text" => {
                            text_content.clear();
                        }
                        _ => {}
                    }
                    path.push(local_name);
                }
                Event::End(_) => {
                    let Some(local_name) = path.pop() else {
                        return Err(EpubError::NcxParseError("结束标签不匹配".to_string()));
                    };

                    match local_name.as_str() {
                        "text" => match path.last().map(String::as_str) {
                            Some("docTitle") if parent_is(&path[..path.len() - 1], "ncx") => {
                                title = Some(text_content.trim().to_string());
                            }
                            Some("docAuthor") => {
                                authors.push(text_content.trim().to_string());
                            }
                            Some("navLabel") if parent_is(&path[..path.len() - 1], "navPoint") => {
                                if let Some(current) = nav_point_stack.last_mut() {
                                    current.label = Some(text_content.clone());
                                }
                            }
                            _ => {}
                        },
                        "navPoint" if inside(&path, "navMap") => {
                            if let Some(pending) = nav_point_stack.pop() {
                                let nav_point = pending.finish()?;
                                match nav_point_stack.last_mut() {
                                    Some(parent) => parent.children.push(nav_point),
                                    None => nav_points.push(nav_point),
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    if path.last().map(String::as_str) == Some("text") {
                        text_content.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if path.last().map(String::as_str) == Some("text") {
                        text_content.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let unique_id = unique_id
            .ok_or_else(|| EpubError::NcxParseError("缺少dtb:uid元数据".to_string()))?;
        let title = title.ok_or_else(|| EpubError::NcxParseError("缺少docTitle".to_string()))?;
        if !has_nav_map {
            return Err(EpubError::NcxParseError("缺少navMap".to_string()));
        }

        let toc = TableOfContents {
            unique_id,
            title,
            authors,
            nav_points,
        };

        if let Some(stored) = stored_depth {
            let actual = toc.depth();
            if stored != actual {
                warn!("NCX中记录的dtb:depth为 {}，实际深度为 {}，以实际深度为准", stored, actual);
            }
        }

        Ok(toc)
    }

    /// 解析meta元素，返回 (name, content)
    fn parse_meta_element(e: &BytesStart) -> Result<(String, String)> {
        let mut name = String::new();
        let mut content = String::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;
            match attr.key.local_name().as_ref() {
                b"name" => name = attr.unescape_value()?.into_owned(),
                b"content" => content = attr.unescape_value()?.into_owned(),
                _ => {}
            }
        }

        Ok((name, content))
    }

    /// 解析navPoint元素的属性，playOrder被忽略
    fn parse_nav_point_attributes(e: &BytesStart) -> Result<PendingNavPoint> {
        let mut pending = PendingNavPoint::default();

        for attr_result in e.attributes() {
            let attr = attr_result?;
            match attr.key.local_name().as_ref() {
                b"id" => pending.id = Some(attr.unescape_value()?.into_owned()),
                b"class" => pending.class = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        Ok(pending)
    }

    /// 解析content元素的src属性
    fn parse_content_src(e: &BytesStart) -> Result<Option<String>> {
        for attr_result in e.attributes() {
            let attr = attr_result?;
            if attr.key.local_name().as_ref() == b"src" {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }
}

/// 直接父元素是否为 `name`
fn parent_is(path: &[String], name: &str) -> bool {
    path.last().is_some_and(|last| last == name)
}

/// 是否位于 `name` 元素内部（任意层级）
fn inside(path: &[String], name: &str) -> bool {
    path.iter().any(|element| element == name)
}
