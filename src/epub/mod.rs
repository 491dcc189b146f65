pub mod error;
pub mod id;
pub mod container;
pub mod writer;
pub mod package;
pub mod config;
pub mod opf;
pub mod ncx;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出容器相关
pub use container::{Container, RootFile};

// 重新导出归档写入和打包
pub use writer::EpubWriter;
pub use package::{Package, Resource, ResourceSource};
pub use config::BookConfig;

// 重新导出OPF相关
pub use opf::{
    Creator,
    ManifestItem,
    ManifestItemBuilder,
    Publication,
    SpineItem,
};

// 重新导出NCX相关
pub use ncx::{
    DepthFirst,
    NavPoint,
    TableOfContents,
    TocTree,
    TocTreeStyle,
    TocStatistics,
};
