pub mod epub;

// === 核心API重新导出 ===

/// 目录（导航树）
pub use epub::{NavPoint, TableOfContents};

/// 错误处理
pub use epub::{EpubError, Result};

/// 打包
pub use epub::{BookConfig, EpubWriter, Package};

// === 底层组件（高级用法） ===

/// 容器组件
pub use epub::{Container, RootFile};

/// OPF组件
pub use epub::{
    Creator,
    ManifestItem,
    ManifestItemBuilder,
    Publication,
    SpineItem,
};

/// NCX组件
pub use epub::{
    DepthFirst,
    TocTree,
    TocTreeStyle,
    TocStatistics,
};

// === 库信息 ===

/// EpubForge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// EpubForge库的描述
pub const DESCRIPTION: &str = "构建EPUB 2电子书的NCX目录与OCF归档";

// === 便捷函数 ===

/// 读取NCX文件
///
/// 这是 `TableOfContents::from_file` 的便捷包装函数。
///
/// # 示例
///
/// ```no_run
/// let toc = epubforge::open_ncx("toc.ncx")?;
/// println!("目录深度: {}", toc.depth());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open_ncx<P: AsRef<std::path::Path>>(path: P) -> Result<TableOfContents> {
    TableOfContents::from_file(path)
}

/// 按配置文件生成EPUB文件
///
/// 配置中的相对源文件路径以配置文件所在目录为基准。
pub fn build_from_config<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(config_path: P, output: Q) -> Result<()> {
    let config = BookConfig::from_file(config_path.as_ref())?;
    let base_dir = config_path
        .as_ref()
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();
    config.to_package(base_dir)?.write_to_path(output)
}
