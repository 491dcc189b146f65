use std::fs;
use std::io::Cursor;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;

use crate::epub::error::{EpubError, Result};

/// container.xml在归档中的固定路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// container.xml的命名空间
pub const CONTAINER_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

/// OPF包文件的媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml，记录包文件（通常是OPF）在归档中的位置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 创建空的Container
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加OPF类型的rootfile
    pub fn add_rootfile(&mut self, full_path: impl Into<String>) {
        self.add_rootfile_with_media_type(full_path, OPF_MEDIA_TYPE);
    }

    /// 添加指定媒体类型的rootfile
    pub fn add_rootfile_with_media_type(&mut self, full_path: impl Into<String>, media_type: impl Into<String>) {
        self.rootfiles.push(RootFile {
            full_path: full_path.into(),
            media_type: media_type.into(),
        });
    }

    /// 从文件路径解析container.xml
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Container> {
        let content = fs::read_to_string(path)?;
        Self::parse_xml(&content)
    }

    /// 解析container.xml内容
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - 解析后的Container信息
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();
        let mut in_rootfiles = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let local_name = e.local_name();
                    match local_name.as_ref() {
                        b"rootfiles" => {
                            in_rootfiles = true;
                        }
                        b"rootfile" if in_rootfiles => {
                            let mut full_path = String::new();
                            let mut media_type = String::new();

                            for attr_result in e.attributes() {
                                let attr = attr_result?;
                                match attr.key.local_name().as_ref() {
                                    b"full-path" => {
                                        full_path = attr.unescape_value()?.into_owned();
                                    }
                                    b"media-type" => {
                                        media_type = attr.unescape_value()?.into_owned();
                                    }
                                    _ => {}
                                }
                            }

                            if full_path.is_empty() || media_type.is_empty() {
                                return Err(EpubError::ContainerParseError(
                                    "rootfile缺少full-path或media-type属性".to_string(),
                                ));
                            }
                            rootfiles.push(RootFile { full_path, media_type });
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"rootfiles" {
                        in_rootfiles = false;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError("没有找到任何rootfile条目".to_string()));
        }

        Ok(Container { rootfiles })
    }

    /// 生成container.xml内容
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut container = BytesStart::new("container");
        container.push_attribute(("version", "1.0"));
        container.push_attribute(("xmlns", CONTAINER_NAMESPACE));
        writer.write_event(Event::Start(container))?;
        writer.write_event(Event::Start(BytesStart::new("rootfiles")))?;

        for rootfile in &self.rootfiles {
            let mut element = BytesStart::new("rootfile");
            element.push_attribute(("full-path", rootfile.full_path.as_str()));
            element.push_attribute(("media-type", rootfile.media_type.as_str()));
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("rootfiles")))?;
        writer.write_event(Event::End(BytesEnd::new("container")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// 获取主要的OPF文件路径
    ///
    /// # 返回值
    /// * `Option<String>` - OPF文件的完整路径
    pub fn get_opf_path(&self) -> Option<String> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.clone())
    }
}
