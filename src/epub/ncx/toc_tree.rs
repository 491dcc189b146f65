//! 目录树（Table of Contents Tree）模块
//!
//! 提供目录在终端中的树形显示和统计功能。

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::epub::ncx::{NavPoint, TableOfContents};

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TocTreeStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 目录树视图
#[derive(Debug, Clone)]
pub struct TocTree<'a> {
    /// 被显示的目录
    toc: &'a TableOfContents,
    /// 显示样式
    style: TocTreeStyle,
    /// 是否显示链接
    show_paths: bool,
    /// 最大显示深度
    max_depth: Option<u32>,
}

impl<'a> TocTree<'a> {
    /// 创建目录树视图
    pub fn new(toc: &'a TableOfContents) -> Self {
        Self {
            toc,
            style: TocTreeStyle::TreeSymbols,
            show_paths: true,
            max_depth: None,
        }
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TocTreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示链接
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 获取目录树的统计信息
    pub fn get_statistics(&self) -> TocStatistics {
        TocStatistics {
            total_nodes: self.toc.len(),
            root_count: self.toc.nav_points.len(),
            leaf_count: self.toc.depth_first().filter(|p| p.children.is_empty()).count(),
            max_depth: self.toc.depth(),
        }
    }

    /// 获取所有章节标题
    pub fn get_all_titles(&self) -> Vec<&'a str> {
        self.toc.depth_first().map(|p| p.label.as_str()).collect()
    }

    /// 深度是否超出显示限制
    fn is_hidden(&self, current_depth: u32) -> bool {
        self.max_depth.is_some_and(|max_depth| current_depth >= max_depth)
    }

    /// 格式化节点内容
    fn format_node(&self, node: &NavPoint) -> String {
        let order = node
            .play_order
            .map(|order| order.to_string())
            .unwrap_or_else(|| "-".to_string());
        if self.show_paths {
            format!("[{}] {} → {}", order, node.label, node.link)
        } else {
            format!("[{}] {}", order, node.label)
        }
    }

    /// 渲染树状符号风格
    fn render_tree_style(
        &self,
        node: &NavPoint,
        current_depth: u32,
        is_last: bool,
        prefix: &str,
        result: &mut String,
    ) {
        if self.is_hidden(current_depth) {
            return;
        }

        let current_prefix = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, current_prefix, self.format_node(node)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (index, child) in node.children.iter().enumerate() {
            let is_child_last = index == node.children.len() - 1;
            self.render_tree_style(child, current_depth + 1, is_child_last, &child_prefix, result);
        }
    }

    /// 渲染缩进风格
    fn render_indent_style(&self, node: &NavPoint, current_depth: u32, result: &mut String) {
        if self.is_hidden(current_depth) {
            return;
        }

        let indent = "  ".repeat(current_depth as usize);
        result.push_str(&format!("{}• {}\n", indent, self.format_node(node)));

        for child in &node.children {
            self.render_indent_style(child, current_depth + 1, result);
        }
    }
}

impl Display for TocTree<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        let depth_info = match self.max_depth {
            Some(max_depth) => format!(" (深度限制: {})", max_depth),
            None => String::new(),
        };
        result.push_str(&format!("📖 {}{}\n", self.toc.title, depth_info));
        result.push_str("═══════════════════════════════════════\n\n");

        let roots = &self.toc.nav_points;
        for (index, root) in roots.iter().enumerate() {
            match self.style {
                TocTreeStyle::TreeSymbols => {
                    let is_last = index == roots.len() - 1;
                    self.render_tree_style(root, 0, is_last, "", &mut result);
                }
                TocTreeStyle::Indented => self.render_indent_style(root, 0, &mut result),
            }
        }

        write!(f, "{}", result)
    }
}

/// 目录树统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocStatistics {
    /// 总节点数
    pub total_nodes: usize,
    /// 根节点数
    pub root_count: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 最大深度
    pub max_depth: u32,
}

impl Display for TocStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "目录统计: {} 个章节, {} 个根节点, {} 个叶子节点, 最大深度: {}",
            self.total_nodes, self.root_count, self.leaf_count, self.max_depth
        )
    }
}
