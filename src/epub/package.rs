//! 电子书打包模块
//!
//! 把出版物（OPF）、目录（NCX）和内容文件组装为一个完整的EPUB归档。

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::epub::container::{CONTAINER_PATH, Container};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::{NCX_MEDIA_TYPE, TableOfContents};
use crate::epub::opf::{ManifestItem, ManifestItemBuilder, NCX_ITEM_ID, Publication};
use crate::epub::writer::EpubWriter;

/// OPF文件在归档中的默认路径
pub const DEFAULT_OPF_PATH: &str = "OEBPS/content.opf";

/// NCX文件相对于OPF的默认路径
pub const DEFAULT_NCX_HREF: &str = "toc.ncx";

/// 资源内容来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// 磁盘上的文件
    File(PathBuf),
    /// 内存中的内容
    Bytes(Vec<u8>),
}

/// 需要写入归档的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// 相对于OPF文件的路径
    pub href: String,
    /// 内容来源
    pub source: ResourceSource,
}

/// 一本待打包的电子书
#[derive(Debug, Clone)]
pub struct Package {
    /// 出版物（清单和脊柱）
    pub publication: Publication,
    /// 目录
    pub toc: TableOfContents,
    /// OPF文件在归档中的路径
    pub opf_path: String,
    /// NCX文件相对于OPF的路径
    pub ncx_href: String,
    resources: Vec<Resource>,
}

impl Package {
    /// 创建打包任务
    pub fn new(publication: Publication, toc: TableOfContents) -> Self {
        Self {
            publication,
            toc,
            opf_path: DEFAULT_OPF_PATH.to_string(),
            ncx_href: DEFAULT_NCX_HREF.to_string(),
            resources: Vec::new(),
        }
    }

    /// 设置OPF文件路径
    pub fn with_opf_path(mut self, opf_path: impl Into<String>) -> Self {
        self.opf_path = opf_path.into();
        self
    }

    /// 设置NCX文件路径
    pub fn with_ncx_href(mut self, ncx_href: impl Into<String>) -> Self {
        self.ncx_href = ncx_href.into();
        self
    }

    /// 已登记的资源
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// 登记磁盘上的文件，同时加入清单，返回清单项ID
    pub fn add_resource_file<P: AsRef<Path>>(&mut self, source: P, item: ManifestItemBuilder) -> Result<String> {
        self.add_resource(ResourceSource::File(source.as_ref().to_path_buf()), item)
    }

    /// 登记内存中的内容，同时加入清单，返回清单项ID
    pub fn add_resource_bytes(&mut self, content: impl Into<Vec<u8>>, item: ManifestItemBuilder) -> Result<String> {
        self.add_resource(ResourceSource::Bytes(content.into()), item)
    }

    fn add_resource(&mut self, source: ResourceSource, item: ManifestItemBuilder) -> Result<String> {
        let item_id = self.publication.add_item(item)?;
        let href = self
            .publication
            .get_item(&item_id)
            .map(|item| item.href.clone())
            .unwrap_or_default();
        self.resources.push(Resource { href, source });
        Ok(item_id)
    }

    /// 归档内相对于OPF目录的完整路径
    fn archive_path(&self, href: &str) -> String {
        match self.opf_path.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => format!("{}/{}", dir, href),
            _ => href.to_string(),
        }
    }

    /// 确保清单中包含NCX项
    fn ensure_ncx_item(publication: &mut Publication, ncx_href: &str) -> Result<()> {
        match publication.get_item(NCX_ITEM_ID) {
            Some(item) if item.media_type == NCX_MEDIA_TYPE => Ok(()),
            Some(item) => Err(EpubError::ManifestError(format!(
                "清单项 '{}' 的媒体类型为 {}，不是NCX",
                NCX_ITEM_ID, item.media_type
            ))),
            None => {
                let item = ManifestItem::builder(ncx_href)
                    .id(NCX_ITEM_ID)
                    .media_type(NCX_MEDIA_TYPE)
                    .spine(false);
                publication.add_item(item)?;
                Ok(())
            }
        }
    }

    /// 把整本书写入归档并完成归档
    ///
    /// container.xml、OPF和NCX全部生成成功后才开始写入条目；
    /// 生成失败时出版物保持不变。
    pub fn write_to<W: Write + Seek>(&mut self, mut writer: EpubWriter<W>) -> Result<W> {
        if self.publication.unique_id != self.toc.unique_id {
            return Err(EpubError::ManifestError(format!(
                "OPF唯一标识符 '{}' 与NCX的 '{}' 不一致",
                self.publication.unique_id, self.toc.unique_id
            )));
        }

        let ncx = self.toc.to_ncx()?;

        let mut publication = self.publication.clone();
        Self::ensure_ncx_item(&mut publication, &self.ncx_href)?;
        let opf = publication.to_opf()?;

        let mut container = Container::new();
        container.add_rootfile(self.opf_path.clone());
        let container_xml = container.to_xml()?;

        let ncx_href = publication
            .get_item(NCX_ITEM_ID)
            .map(|item| item.href.clone())
            .unwrap_or_else(|| self.ncx_href.clone());
        self.publication = publication;

        writer.write_str(CONTAINER_PATH, &container_xml)?;
        writer.write_str(&self.opf_path, &opf)?;
        writer.write_str(&self.archive_path(&ncx_href), &ncx)?;

        for resource in &self.resources {
            let archive_path = self.archive_path(&resource.href);
            match &resource.source {
                ResourceSource::File(path) => writer.write_file(path, Some(&archive_path))?,
                ResourceSource::Bytes(content) => writer.write_bytes(&archive_path, content)?,
            }
        }

        debug!(
            "打包完成: {} 个清单项, {} 个导航点",
            self.publication.items().len(),
            self.toc.len()
        );
        writer.finish()
    }

    /// 把整本书写入指定路径的EPUB文件
    ///
    /// 失败时删除已创建的输出文件，不留下不完整的归档。
    pub fn write_to_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = EpubWriter::create(path)?;
        match self.write_to(writer) {
            Ok(_) => {
                info!("已生成EPUB文件: {}", path.display());
                Ok(())
            }
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(path) {
                    warn!("无法删除不完整的输出文件 {}: {}", path.display(), remove_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::ncx::NavPoint;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn sample_package() -> Package {
        let mut publication = Publication::new("book-1", "Sample");
        publication.add_author("Sample Author", None);
        let mut toc = TableOfContents::new("book-1", "Sample", vec!["Sample Author".to_string()]);
        toc.add_nav_point(NavPoint::with_id("Chapter 1", "c1.html", "c1"));
        Package::new(publication, toc)
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_archive_path() {
        let package = sample_package();
        assert_eq!(package.archive_path("c1.html"), "OEBPS/c1.html");
        let package = package.with_opf_path("content.opf");
        assert_eq!(package.archive_path("c1.html"), "c1.html");
    }

    #[test]
    fn test_write_package() {
        let mut package = sample_package();
        package
            .add_resource_bytes("<html/>", ManifestItem::builder("c1.html").id("c1"))
            .unwrap();

        let writer = EpubWriter::new(Cursor::new(Vec::new())).unwrap();
        let cursor = package.write_to(writer).unwrap();
        let mut archive = ZipArchive::new(cursor).unwrap();

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names[0], "mimetype");
        for name in ["META-INF/container.xml", "OEBPS/content.opf", "OEBPS/toc.ncx", "OEBPS/c1.html"] {
            assert!(names.iter().any(|n| n == name), "missing {}", name);
        }

        let container = Container::parse_xml(&read_entry(&mut archive, "META-INF/container.xml")).unwrap();
        assert_eq!(container.get_opf_path().as_deref(), Some("OEBPS/content.opf"));

        let publication = Publication::parse_xml(&read_entry(&mut archive, "OEBPS/content.opf")).unwrap();
        assert_eq!(publication.get_item("ncx").map(|i| i.href.as_str()), Some("toc.ncx"));
        assert_eq!(publication.spine_items().len(), 1);

        let toc = TableOfContents::parse_xml(&read_entry(&mut archive, "OEBPS/toc.ncx")).unwrap();
        assert_eq!(toc.unique_id, "book-1");
        assert_eq!(toc.nav_points[0].link, "c1.html");
    }

    #[test]
    fn test_unique_id_mismatch() {
        let mut package = sample_package();
        package.toc.unique_id = "other".to_string();
        let writer = EpubWriter::new(Cursor::new(Vec::new())).unwrap();
        assert!(matches!(
            package.write_to(writer),
            Err(EpubError::ManifestError(_))
        ));
    }

    #[test]
    fn test_existing_ncx_item_with_wrong_type() {
        let mut package = sample_package();
        package
            .publication
            .add_item(ManifestItem::builder("ncx.html").id("ncx").spine(false))
            .unwrap();
        let writer = EpubWriter::new(Cursor::new(Vec::new())).unwrap();
        assert!(package.write_to(writer).is_err());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("broken.epub");

        let mut package = sample_package();
        package.toc.add_nav_point(NavPoint::with_id("Chapter 2", "c2.html", "c1"));
        let before = package.publication.clone();

        assert!(matches!(
            package.write_to_path(&output),
            Err(EpubError::DuplicateId(ref id)) if id == "c1"
        ));
        assert!(!output.exists());
        assert_eq!(package.publication, before);
        assert!(package.publication.get_item("ncx").is_none());
    }

    #[test]
    fn test_failed_resource_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.epub");

        let mut package = sample_package();
        package
            .add_resource_file(dir.path().join("missing.html"), ManifestItem::builder("c1.html").id("c1"))
            .unwrap();

        assert!(matches!(package.write_to_path(&output), Err(EpubError::Io(_))));
        assert!(!output.exists());
    }
}
