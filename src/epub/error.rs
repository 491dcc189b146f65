use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF文件解析错误: {0}")]
    OpfParseError(String),

    #[error("NCX文件解析错误: {0}")]
    NcxParseError(String),

    #[error("清单项无效: {0}")]
    ManifestError(String),

    #[error("导航点ID重复: {0}")]
    DuplicateId(String),

    #[error("导航点 '{0}' 的标签为空")]
    EmptyLabel(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EpubError::XmlError(quick_xml::Error::InvalidAttr(err))
    }
}
