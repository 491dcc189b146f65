use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use epubforge::epub::config::DEFAULT_CONFIG_PATH;
use epubforge::{BookConfig, Result, TableOfContents, TocTree, TocTreeStyle};
use tracing_subscriber::{EnvFilter, fmt};

/// 📚 EpubForge - EPUB电子书打包工具
#[derive(Parser)]
#[command(name = "epubforge")]
#[command(about = "生成NCX目录并打包EPUB 2电子书")]
#[command(version)]
struct Args {
    /// 日志级别（也可以是完整的过滤规则，如 epubforge=debug）
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 按配置文件生成EPUB
    Build {
        /// 书籍配置文件
        config: PathBuf,
        /// 输出的EPUB文件路径
        #[arg(short, long, default_value = "book.epub")]
        output: PathBuf,
    },
    /// 显示NCX文件的目录树
    Toc {
        /// NCX文件路径
        ncx_file: PathBuf,
        /// 显示样式
        #[arg(long, value_enum, default_value = "tree")]
        style: DisplayStyle,
        /// 显示每个目录项指向的文件
        #[arg(long)]
        paths: bool,
        /// 最大显示深度
        #[arg(long)]
        max_depth: Option<u32>,
    },
    /// 重新编号NCX文件的播放顺序
    Renumber {
        /// NCX文件路径
        ncx_file: PathBuf,
        /// 输出路径，省略时打印到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 生成示例配置文件
    Init {
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

/// 目录树显示样式
#[derive(ValueEnum, Clone, Copy, Debug)]
enum DisplayStyle {
    /// 树形符号
    Tree,
    /// 缩进
    Indented,
}

impl From<DisplayStyle> for TocTreeStyle {
    fn from(style: DisplayStyle) -> Self {
        match style {
            DisplayStyle::Tree => TocTreeStyle::TreeSymbols,
            DisplayStyle::Indented => TocTreeStyle::Indented,
        }
    }
}

fn main() {
    let args = Args::parse();
    install_tracing(&args.log);

    if let Err(e) = run(args.command) {
        eprintln!("❌ 错误: {}", e);
        std::process::exit(1);
    }
}

fn install_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build { config, output } => {
            println!("📚 正在按配置构建: {}", config.display());
            epubforge::build_from_config(&config, &output)?;
            println!("🎉 已生成: {}", output.display());
        }
        Command::Toc {
            ncx_file,
            style,
            paths,
            max_depth,
        } => {
            let mut toc = TableOfContents::from_file(&ncx_file)?;
            toc.assign_play_order();
            let tree = TocTree::new(&toc)
                .with_style(style.into())
                .with_show_paths(paths)
                .with_max_depth(max_depth);

            println!("{}", tree);
            println!("📊 {}", tree.get_statistics());
        }
        Command::Renumber { ncx_file, output } => {
            let mut toc = TableOfContents::from_file(&ncx_file)?;
            let ncx = toc.to_ncx()?;
            match output {
                Some(path) => {
                    fs::write(&path, ncx)?;
                    println!("✅ 已为 {} 个目录项重新编号: {}", toc.len(), path.display());
                }
                None => print!("{}", ncx),
            }
        }
        Command::Init { path } => {
            BookConfig::generate_default_config(&path)?;
            println!("📝 已生成示例配置: {}", path.display());
        }
    }

    Ok(())
}
