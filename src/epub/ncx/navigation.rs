//! NCX导航点数据结构定义
//!
//! 导航点构成一棵有序树，每个节点独占其子节点，没有指向父节点的引用。

use crate::epub::id::random_id;

/// 导航点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// 唯一标识符
    pub id: String,
    /// 播放顺序，仅在序列化前编号后有效
    pub play_order: Option<u32>,
    /// CSS类名（可选）
    pub class: Option<String>,
    /// 显示文本
    pub label: String,
    /// 指向内容的相对路径（可带片段）
    pub link: String,
    /// 子导航点
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    /// 创建新的导航点，ID随机生成
    pub fn new(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self::with_id(label, link, random_id())
    }

    /// 使用指定ID创建导航点
    pub fn with_id(label: impl Into<String>, link: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            play_order: None,
            class: None,
            label: label.into(),
            link: link.into(),
            children: Vec::new(),
        }
    }

    /// 设置ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// 设置CSS类名
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// 添加子导航点
    pub fn add_child(&mut self, child: NavPoint) {
        self.children.push(child);
    }

    /// 添加子导航点并返回自身，便于链式构建
    pub fn child(mut self, child: NavPoint) -> Self {
        self.add_child(child);
        self
    }

    /// 获取导航深度（叶子节点为1）
    pub fn depth(&self) -> u32 {
        1 + self.children.iter().map(NavPoint::depth).max().unwrap_or(0)
    }

    /// 按深度优先（先序）遍历当前节点及其全部子孙
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst { stack: vec![self] }
    }

    /// 节点总数（包括自身）
    pub fn len(&self) -> usize {
        self.depth_first().count()
    }

    /// 导航点总是包含自身，永远不为空
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 根据ID查找导航点
    pub fn find_by_id(&self, id: &str) -> Option<&NavPoint> {
        self.depth_first().find(|point| point.id == id)
    }

    /// 根据路径数组获取子节点，`[]` 表示当前节点本身
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&NavPoint> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => self.children.get(index)?.get_node_by_path(rest),
        }
    }

    /// 从 `next` 开始按先序为子树编号，返回下一个可用编号
    pub(crate) fn number_from(&mut self, next: u32) -> u32 {
        self.play_order = Some(next);
        let mut next = next + 1;
        for child in &mut self.children {
            next = child.number_from(next);
        }
        next
    }
}

/// 深度优先迭代器
///
/// 每次调用 `depth_first()` 都得到新的迭代器，遍历过程只读。
#[derive(Debug, Clone)]
pub struct DepthFirst<'a> {
    stack: Vec<&'a NavPoint>,
}

impl<'a> DepthFirst<'a> {
    /// 依次遍历多个根节点
    pub(crate) fn over(roots: &'a [NavPoint]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a NavPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.stack.pop()?;
        self.stack.extend(point.children.iter().rev());
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::id::{DEFAULT_ID_LENGTH, ID_COMPONENTS};

    fn chapter() -> NavPoint {
        NavPoint::with_id("Chapter 1", "c1.html", "c1")
            .child(
                NavPoint::with_id("Part A", "c1.html#a", "c1a")
                    .child(NavPoint::with_id("Detail", "c1.html#a1", "c1a1")),
            )
            .child(NavPoint::with_id("Part B", "c1.html#b", "c1b"))
    }

    #[test]
    fn test_leaf_depth_is_one() {
        assert_eq!(NavPoint::new("Prologue", "prologue.html").depth(), 1);
    }

    #[test]
    fn test_nested_depth() {
        assert_eq!(chapter().depth(), 3);
    }

    #[test]
    fn test_generated_id() {
        let point = NavPoint::new("Prologue", "prologue.html");
        assert_eq!(point.id.len(), DEFAULT_ID_LENGTH);
        assert!(point.id.chars().all(|c| ID_COMPONENTS.contains(&c)));
        assert_eq!(point.play_order, None);
        assert_eq!(point.class, None);
    }

    #[test]
    fn test_builder_overrides() {
        let point = NavPoint::new("Cover", "cover.html").id("cover").class("front");
        assert_eq!(point.id, "cover");
        assert_eq!(point.class.as_deref(), Some("front"));
    }

    #[test]
    fn test_depth_first_is_preorder() {
        let point = chapter();
        let ids: Vec<&str> = point.depth_first().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c1a", "c1a1", "c1b"]);
    }

    #[test]
    fn test_depth_first_is_restartable() {
        let point = chapter();
        let mut first = point.depth_first();
        first.next();
        assert_eq!(point.depth_first().count(), 4);
        assert_eq!(first.count(), 3);
    }

    #[test]
    fn test_add_child_keeps_order_and_play_order() {
        let mut point = NavPoint::with_id("Root", "r.html", "r");
        point.add_child(NavPoint::with_id("Second", "s.html", "s"));
        point.add_child(NavPoint::with_id("First", "f.html", "f"));
        assert_eq!(point.children[0].id, "s");
        assert_eq!(point.children[1].id, "f");
        assert!(point.depth_first().all(|p| p.play_order.is_none()));
    }

    #[test]
    fn test_number_from() {
        let mut point = chapter();
        assert_eq!(point.number_from(5), 9);
        let orders: Vec<u32> = point.depth_first().filter_map(|p| p.play_order).collect();
        assert_eq!(orders, [5, 6, 7, 8]);
    }

    #[test]
    fn test_find_and_path_lookup() {
        let point = chapter();
        assert_eq!(point.find_by_id("c1a1").map(|p| p.label.as_str()), Some("Detail"));
        assert!(point.find_by_id("missing").is_none());
        assert_eq!(point.get_node_by_path(&[0, 0]).map(|p| p.id.as_str()), Some("c1a1"));
        assert_eq!(point.get_node_by_path(&[]).map(|p| p.id.as_str()), Some("c1"));
        assert!(point.get_node_by_path(&[2]).is_none());
        assert_eq!(point.len(), 4);
    }
}
