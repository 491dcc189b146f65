//! 书籍配置模块
//!
//! 从YAML文件描述一本书：元数据、输出位置、内容文件以及目录结构，
//! 并据此组装出可以直接写出的 [`Package`]。

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::epub::error::{EpubError, Result};
use crate::epub::id::random_id;
use crate::epub::ncx::{NavPoint, TableOfContents};
use crate::epub::opf::{DEFAULT_LANGUAGE, ManifestItem, Publication};
use crate::epub::package::{DEFAULT_NCX_HREF, DEFAULT_OPF_PATH, Package};

/// `init` 命令默认生成的配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "book.yaml";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_opf_path() -> String {
    DEFAULT_OPF_PATH.to_string()
}

fn default_ncx_href() -> String {
    DEFAULT_NCX_HREF.to_string()
}

/// 作者配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorConfig {
    /// 姓名
    pub name: String,
    /// 排序用名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_as: Option<String>,
}

/// 输出位置配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// OPF文件在归档中的路径
    #[serde(default = "default_opf_path")]
    pub opf_path: String,
    /// NCX文件相对于OPF的路径
    #[serde(default = "default_ncx_href")]
    pub ncx_href: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            opf_path: default_opf_path(),
            ncx_href: default_ncx_href(),
        }
    }
}

/// 内容文件配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// 源文件路径，相对路径以配置文件所在目录为基准
    pub source: PathBuf,
    /// 归档内相对于OPF的路径，省略时使用源文件名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// 是否加入脊柱，省略时按媒体类型决定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spine: Option<bool>,
}

/// 目录条目配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntryConfig {
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntryConfig>,
}

impl TocEntryConfig {
    fn to_nav_point(&self) -> NavPoint {
        let mut nav_point = match &self.id {
            Some(id) => NavPoint::with_id(&self.label, &self.href, id),
            None => NavPoint::new(&self.label, &self.href),
        };
        if let Some(class) = &self.class {
            nav_point = nav_point.class(class);
        }
        for child in &self.children {
            nav_point.add_child(child.to_nav_point());
        }
        nav_point
    }
}

/// 一本书的完整配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    /// 唯一标识符，同时用于OPF和NCX
    pub unique_id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<AuthorConfig>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub files: Vec<FileConfig>,
    #[serde(default)]
    pub toc: Vec<TocEntryConfig>,
}

impl FromStr for BookConfig {
    type Err = EpubError;

    fn from_str(content: &str) -> Result<Self> {
        serde_yml::from_str(content).map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }
}

impl BookConfig {
    /// 从YAML文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            EpubError::ConfigError(format!("无法读取配置文件 {}: {}", path.as_ref().display(), e))
        })?;
        content.parse()
    }

    /// 序列化为YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))
    }

    /// 示例配置
    pub fn default_config() -> Self {
        Self {
            unique_id: random_id(),
            title: "My Book".to_string(),
            authors: vec![AuthorConfig {
                name: "Jane Doe".to_string(),
                file_as: Some("Doe, Jane".to_string()),
            }],
            language: default_language(),
            output: OutputConfig::default(),
            files: vec![
                FileConfig {
                    source: PathBuf::from("text/chapter1.html"),
                    href: Some("chapter1.html".to_string()),
                    id: Some("chapter1".to_string()),
                    media_type: None,
                    spine: None,
                },
                FileConfig {
                    source: PathBuf::from("images/cover.jpg"),
                    href: None,
                    id: Some("cover".to_string()),
                    media_type: None,
                    spine: None,
                },
            ],
            toc: vec![TocEntryConfig {
                label: "Chapter 1".to_string(),
                href: "chapter1.html".to_string(),
                id: None,
                class: Some("chapter".to_string()),
                children: vec![TocEntryConfig {
                    label: "Section 1.1".to_string(),
                    href: "chapter1.html#s1".to_string(),
                    id: None,
                    class: None,
                    children: Vec::new(),
                }],
            }],
        }
    }

    /// 把带注释的示例配置写到指定路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = Self::default_config().to_yaml()?;

        let content_with_header = format!(
            "# 书籍配置文件\n# files中的source相对于本文件所在目录，href相对于OPF文件\n# toc描述目录树，children可以任意嵌套\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 根据配置构建出版物
    pub fn to_publication(&self) -> Publication {
        let mut publication = Publication::new(&self.unique_id, &self.title);
        for author in &self.authors {
            publication.add_author(&author.name, author.file_as.clone());
        }
        publication.language = self.language.clone();
        publication
    }

    /// 根据配置构建目录
    pub fn to_table_of_contents(&self) -> TableOfContents {
        let authors = self.authors.iter().map(|author| author.name.clone()).collect();
        let mut toc = TableOfContents::new(&self.unique_id, &self.title, authors);
        for entry in &self.toc {
            toc.add_nav_point(entry.to_nav_point());
        }
        toc
    }

    /// 组装打包任务
    ///
    /// # 参数
    /// * `base_dir` - 解析相对源文件路径时使用的目录
    ///
    /// # 返回值
    /// * `Result<Package, EpubError>` - 源文件缺失或清单项无效时返回错误
    pub fn to_package<P: AsRef<Path>>(&self, base_dir: P) -> Result<Package> {
        let mut package = Package::new(self.to_publication(), self.to_table_of_contents())
            .with_opf_path(&self.output.opf_path)
            .with_ncx_href(&self.output.ncx_href);

        for file in &self.files {
            let source = base_dir.as_ref().join(&file.source);
            if !source.is_file() {
                return Err(EpubError::ConfigError(format!("源文件不存在: {}", source.display())));
            }

            let href = match &file.href {
                Some(href) => href.clone(),
                None => file
                    .source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        EpubError::ConfigError(format!("无法从 {} 推断href", file.source.display()))
                    })?,
            };

            let mut item = ManifestItem::builder(href);
            if let Some(id) = &file.id {
                item = item.id(id);
            }
            if let Some(media_type) = &file.media_type {
                item = item.media_type(media_type);
            }
            if let Some(spine) = file.spine {
                item = item.spine(spine);
            }
            let item_id = package.add_resource_file(&source, item)?;
            debug!("登记文件 {} -> {}", source.display(), item_id);
        }

        let hrefs: Vec<&str> = package.resources().iter().map(|r| r.href.as_str()).collect();
        for nav_point in package.toc.depth_first() {
            let target = nav_point.link.split('#').next().unwrap_or_default();
            if !hrefs.contains(&target) {
                warn!("目录项 '{}' 指向的 {} 不在文件列表中", nav_point.label, nav_point.link);
            }
        }

        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
unique_id: book-1
title: Sample
authors:
  - name: Jane Doe
    file_as: Doe, Jane
files:
  - source: c1.html
    id: c1
  - source: img/cover.jpg
    href: images/cover.jpg
toc:
  - label: Chapter 1
    href: c1.html
    id: ch1
    class: chapter
    children:
      - label: Section 1.1
        href: c1.html#s1
"#;

    #[test]
    fn test_parse_config() {
        let config: BookConfig = SAMPLE_CONFIG.parse().unwrap();
        assert_eq!(config.unique_id, "book-1");
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.files.len(), 2);
        assert_eq!(config.files[1].href.as_deref(), Some("images/cover.jpg"));
        assert_eq!(config.toc[0].children[0].label, "Section 1.1");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            "title: [unclosed".parse::<BookConfig>(),
            Err(EpubError::ConfigError(_))
        ));
        // 缺少必填的unique_id
        assert!("title: Book".parse::<BookConfig>().is_err());
    }

    #[test]
    fn test_table_of_contents() {
        let config: BookConfig = SAMPLE_CONFIG.parse().unwrap();
        let toc = config.to_table_of_contents();
        assert_eq!(toc.unique_id, "book-1");
        assert_eq!(toc.authors, ["Jane Doe"]);
        assert_eq!(toc.depth(), 2);
        let chapter = toc.find_by_id("ch1").unwrap();
        assert_eq!(chapter.class.as_deref(), Some("chapter"));
        assert_eq!(chapter.children[0].link, "c1.html#s1");
    }

    #[test]
    fn test_to_package() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c1.html"), "<html/>").unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/cover.jpg"), [0xFF, 0xD8]).unwrap();

        let config: BookConfig = SAMPLE_CONFIG.parse().unwrap();
        let package = config.to_package(dir.path()).unwrap();

        assert_eq!(package.opf_path, DEFAULT_OPF_PATH);
        assert_eq!(package.resources().len(), 2);
        assert_eq!(package.publication.get_item("c1").map(|i| i.href.as_str()), Some("c1.html"));
        let hrefs: Vec<&str> = package.publication.spine_items().iter().map(|i| i.href.as_str()).collect();
        assert_eq!(hrefs, ["c1.html"]);
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let config: BookConfig = SAMPLE_CONFIG.parse().unwrap();
        assert!(matches!(
            config.to_package(dir.path()),
            Err(EpubError::ConfigError(ref msg)) if msg.contains("c1.html")
        ));
    }

    #[test]
    fn test_generate_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);
        BookConfig::generate_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# 书籍配置文件"));

        let config = BookConfig::from_file(&path).unwrap();
        assert_eq!(config.title, "My Book");
        assert_eq!(config.unique_id.len(), 8);
        assert_eq!(config.toc[0].children.len(), 1);
    }
}
