//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及添加清单项时的校验规则。

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::epub::error::{EpubError, Result};

/// 文件扩展名到媒体类型的映射
pub static MIME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "application/xhtml+xml"),
        ("xhtml", "application/xhtml+xml"),
        ("css", "text/css"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("ncx", "application/x-dtbncx+xml"),
        ("txt", "text/plain"),
        ("pdf", "application/pdf"),
    ])
});

/// 可以出现在脊柱中的内容类型
const SPINE_MEDIA_TYPES: [&str; 3] = [
    "application/x-dtbook+xml",
    "application/xhtml+xml",
    "text/x-oeb1-document",
];

/// 根据文件扩展名推断媒体类型
pub fn guess_media_type(href: &str) -> Option<&'static str> {
    let (_, ext) = href.rsplit_once('.')?;
    MIME_MAP.get(ext.to_ascii_lowercase().as_str()).copied()
}

/// 媒体类型是否属于"内容"文档，可加入脊柱
///
/// 结果只用于常见情况下的合理默认值，并非权威判断。
pub fn is_spine_media_type(media_type: &str) -> bool {
    SPINE_MEDIA_TYPES.contains(&media_type)
}

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
        }
    }

    /// 开始构建一个待添加的清单项，其余属性可省略
    pub fn builder(href: impl Into<String>) -> ManifestItemBuilder {
        ManifestItemBuilder {
            href: href.into(),
            id: None,
            media_type: None,
            spine: None,
        }
    }

    /// 检查是否为图片文件
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// 待添加的清单项
///
/// 省略的属性在加入 [`Publication`](crate::epub::opf::Publication) 时补全：
/// ID随机生成，媒体类型按扩展名推断，内容文档默认加入脊柱。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItemBuilder {
    href: String,
    id: Option<String>,
    media_type: Option<String>,
    spine: Option<bool>,
}

impl ManifestItemBuilder {
    /// 指定ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 指定媒体类型
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// 指定是否加入脊柱
    pub fn spine(mut self, spine: bool) -> Self {
        self.spine = Some(spine);
        self
    }

    /// 补全缺省属性，返回清单项和是否加入脊柱
    ///
    /// `id_provider` 仅在未指定ID时调用。
    pub(crate) fn resolve<F>(self, id_provider: F) -> Result<(ManifestItem, bool)>
    where
        F: FnOnce() -> String,
    {
        let media_type = match self.media_type {
            Some(media_type) => media_type,
            None => guess_media_type(&self.href)
                .ok_or_else(|| EpubError::ManifestError(format!("无法确定文件 {} 的媒体类型", self.href)))?
                .to_string(),
        };

        let spine = match self.spine {
            None => is_spine_media_type(&media_type),
            Some(true) if !is_spine_media_type(&media_type) => {
                return Err(EpubError::ManifestError(format!(
                    "媒体类型为 {} 的清单项不能加入脊柱",
                    media_type
                )));
            }
            Some(spine) => spine,
        };

        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => id_provider(),
        };

        Ok((ManifestItem::new(id, self.href, media_type), spine))
    }
}
