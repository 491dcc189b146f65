//! 归档写入模块
//!
//! 以OCF要求的方式写出zip归档：`mimetype` 不压缩且排在最前，其余条目压缩。

use std::fs::{self, File};
use std::io::{self, ErrorKind, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::epub::error::{EpubError, Result};

/// EPUB的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 写入OCF归档（EPUB文件）
///
/// 创建时立即写入未压缩的 `mimetype` 条目，保证它是归档中的第一个文件。
/// container.xml、OPF等必要内容由调用方（通常是 [`Package`](crate::epub::Package)）写入。
pub struct EpubWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    deflated: SimpleFileOptions,
}

impl EpubWriter<File> {
    /// 在指定路径创建EPUB文件
    ///
    /// # 参数
    /// * `path` - 输出文件路径
    ///
    /// # 返回值
    /// * `Result<EpubWriter<File>, EpubError>` - 已写入mimetype的写入器
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!("创建EPUB文件: {}", path.as_ref().display());
        Self::new(file)
    }
}

impl<W: Write + Seek> EpubWriter<W> {
    /// 基于任意可写可定位的目标创建写入器
    pub fn new(writer: W) -> Result<Self> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        Ok(Self {
            zip,
            deflated: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        })
    }

    /// 把磁盘上的文件写入归档
    ///
    /// # 参数
    /// * `path` - 源文件路径
    /// * `archive_path` - 归档内路径，省略时使用源文件名
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P, archive_path: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        let archive_path = match archive_path {
            Some(archive_path) => archive_path.to_string(),
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    io_error(
                        ErrorKind::InvalidInput,
                        format!("无法从路径 {} 推断归档内文件名", path.display()),
                    )
                })?,
        };

        let content = fs::read(path)?;
        self.write_bytes(&archive_path, &content)
    }

    /// 以文本内容在归档中创建文件
    pub fn write_str(&mut self, archive_path: &str, content: &str) -> Result<()> {
        self.write_bytes(archive_path, content.as_bytes())
    }

    /// 以二进制内容在归档中创建文件
    pub fn write_bytes(&mut self, archive_path: &str, content: &[u8]) -> Result<()> {
        if archive_path == "mimetype" {
            return Err(io_error(ErrorKind::AlreadyExists, "mimetype条目由写入器自动创建"));
        }

        debug!("写入归档条目: {} ({} 字节)", archive_path, content.len());
        self.zip.start_file(archive_path, self.deflated)?;
        self.zip.write_all(content)?;
        Ok(())
    }

    /// 完成归档并返回底层写入目标
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

fn io_error(kind: ErrorKind, message: impl Into<String>) -> EpubError {
    EpubError::Io(io::Error::new(kind, message.into()))
}
