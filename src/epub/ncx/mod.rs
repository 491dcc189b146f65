//! NCX（Navigation Control file for XML）模块
//!
//! 此模块提供目录（导航树）的构建、遍历、编号，以及与NCX文件之间的相互转换。

pub mod navigation;
pub mod parser;
pub mod toc;
pub mod toc_tree;

pub use navigation::{DepthFirst, NavPoint};
pub use toc::{NCX_MEDIA_TYPE, NCX_NAMESPACE, TableOfContents};
pub use toc_tree::{TocStatistics, TocTree, TocTreeStyle};
