//! 目录（TableOfContents）模块
//!
//! 维护导航点树以及文档级元数据，并负责生成NCX文件。

use std::collections::HashSet;
use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{DepthFirst, NavPoint};

/// NCX命名空间
pub const NCX_NAMESPACE: &str = "http://www.daisy.org/z3986/2005/ncx/";

/// NCX媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

const NCX_DOCTYPE: &str =
    r#"ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd""#;

/// 一本书的目录，对应一个NCX文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOfContents {
    /// 唯一标识符，须与OPF中的一致
    pub unique_id: String,
    /// 文档标题
    pub title: String,
    /// 作者列表
    pub authors: Vec<String>,
    /// 顶层导航点
    pub nav_points: Vec<NavPoint>,
}

impl TableOfContents {
    /// 创建空目录
    pub fn new(unique_id: impl Into<String>, title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            title: title.into(),
            authors,
            nav_points: Vec::new(),
        }
    }

    /// 添加顶层导航点
    pub fn add_nav_point(&mut self, nav_point: NavPoint) {
        self.nav_points.push(nav_point);
    }

    /// 目录深度，没有导航点时为0
    pub fn depth(&self) -> u32 {
        self.nav_points.iter().map(NavPoint::depth).max().unwrap_or(0)
    }

    /// 按深度优先顺序遍历所有导航点
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst::over(&self.nav_points)
    }

    /// 导航点总数
    pub fn len(&self) -> usize {
        self.depth_first().count()
    }

    /// 是否没有任何导航点
    pub fn is_empty(&self) -> bool {
        self.nav_points.is_empty()
    }

    /// 按深度优先顺序为所有导航点编号（从1开始）
    ///
    /// 树没有变化时重复调用得到相同的编号。
    pub fn assign_play_order(&mut self) {
        let mut next = 1;
        for nav_point in &mut self.nav_points {
            next = nav_point.number_from(next);
        }
        debug!("为 {} 个导航点分配了playOrder", next - 1);
    }

    /// 检查所有导航点ID是否唯一
    pub fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for point in self.depth_first() {
            if !seen.insert(point.id.as_str()) {
                return Err(EpubError::DuplicateId(point.id.clone()));
            }
        }
        Ok(())
    }

    /// 检查所有导航点都有非空标签
    pub fn check_labels(&self) -> Result<()> {
        match self.depth_first().find(|point| point.label.is_empty()) {
            Some(point) => Err(EpubError::EmptyLabel(point.id.clone())),
            None => Ok(()),
        }
    }

    /// 根据ID查找导航点
    pub fn find_by_id(&self, id: &str) -> Option<&NavPoint> {
        self.depth_first().find(|point| point.id == id)
    }

    /// 根据链接查找第一个匹配的导航点
    pub fn find_by_link(&self, link: &str) -> Option<&NavPoint> {
        self.depth_first().find(|point| point.link == link)
    }

    /// 根据路径数组获取节点
    ///
    /// - `[0]` 表示第一个顶层导航点
    /// - `[1, 0, 2]` 表示第二个顶层导航点的第一个子节点的第三个子节点
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&NavPoint> {
        let (&root_index, rest) = path.split_first()?;
        self.nav_points.get(root_index)?.get_node_by_path(rest)
    }

    /// 生成NCX文件内容
    ///
    /// 生成前会检查ID唯一性和标签，并重新编号所有导航点。
    pub fn to_ncx(&mut self) -> Result<String> {
        self.check_unique_ids()?;
        self.check_labels()?;
        self.assign_play_order();

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::DocType(BytesText::from_escaped(NCX_DOCTYPE)))?;

        let mut ncx = BytesStart::new("ncx");
        ncx.push_attribute(("xmlns", NCX_NAMESPACE));
        ncx.push_attribute(("version", "2005-1"));
        ncx.push_attribute(("xml:lang", "en"));
        writer.write_event(Event::Start(ncx))?;

        // 以下四项元数据是所有NCX文件都必须提供的
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        let depth = self.depth().to_string();
        for (name, content) in [
            ("dtb:uid", self.unique_id.as_str()),
            ("dtb:depth", depth.as_str()),
            ("dtb:totalPageCount", "0"),
            ("dtb:maxPageNumber", "0"),
        ] {
            let mut meta = BytesStart::new("meta");
            meta.push_attribute(("name", name));
            meta.push_attribute(("content", content));
            writer.write_event(Event::Empty(meta))?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;

        write_text_element(&mut writer, "docTitle", &self.title)?;
        for author in &self.authors {
            write_text_element(&mut writer, "docAuthor", author)?;
        }

        writer.write_event(Event::Start(BytesStart::new("navMap")))?;
        for nav_point in &self.nav_points {
            write_nav_point(&mut writer, nav_point)?;
        }
        writer.write_event(Event::End(BytesEnd::new("navMap")))?;

        writer.write_event(Event::End(BytesEnd::new("ncx")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// 写出 `<name><text>...</text></name>` 结构
fn write_text_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Start(BytesStart::new("text")))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("text")))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// 递归写出导航点
fn write_nav_point<W: std::io::Write>(writer: &mut Writer<W>, nav_point: &NavPoint) -> Result<()> {
    let play_order = nav_point.play_order.unwrap_or_default().to_string();

    let mut start = BytesStart::new("navPoint");
    start.push_attribute(("id", nav_point.id.as_str()));
    start.push_attribute(("playOrder", play_order.as_str()));
    if let Some(class) = &nav_point.class {
        start.push_attribute(("class", class.as_str()));
    }
    writer.write_event(Event::Start(start))?;

    write_text_element(writer, "navLabel", &nav_point.label)?;

    let mut content = BytesStart::new("content");
    content.push_attribute(("src", nav_point.link.as_str()));
    writer.write_event(Event::Empty(content))?;

    for child in &nav_point.children {
        write_nav_point(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("navPoint")))?;
    Ok(())
}
