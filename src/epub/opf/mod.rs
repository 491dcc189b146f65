//! OPF（Open Packaging Format）模块
//!
//! 此模块提供EPUB包文件的生成与解析，包括元数据、清单和脊柱。

mod manifest;
mod parser;
mod publication;
mod spine;

pub use manifest::{MIME_MAP, ManifestItem, ManifestItemBuilder, guess_media_type, is_spine_media_type};
pub use publication::{
    Creator, DC_NAMESPACE, DEFAULT_LANGUAGE, NCX_ITEM_ID, OPF_NAMESPACE, Publication, UNIQUE_IDENTIFIER_ID,
};
pub use spine::SpineItem;
