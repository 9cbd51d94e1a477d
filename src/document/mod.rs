// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 文档模型模块
///
/// `DocumentModel` 独占一棵DOM树的节点区（arena），提供查询、修改和序列化操作。
/// 主文档与备用（AMP）文档各自拥有独立的节点区，节点之间不共享，
/// 跨文档复制子树时必须进行深拷贝（见 [`DocumentModel::import`]）。
mod parse;
mod serialize;

pub use serialize::VOID_ELEMENTS;

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

/// 节点标识符，只在所属文档内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 元素数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// 元素名称（小写）
    pub name: String,
    /// 属性列表，保持文档中的顺序
    pub attrs: Vec<(String, String)>,
}

/// 节点数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// 文档根节点
    Document,
    /// 文档类型声明
    Doctype(String),
    /// 元素节点
    Element(ElementData),
    /// 文本节点
    Text(String),
    /// 注释节点
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// 已解析的HTML文档
///
/// 子节点以兄弟链表相连，分离、插入和移除都是常数时间。
/// 被移除的节点仍留在节点区中，但从根节点不可达。
/// `Clone` 产生一份完全独立的深拷贝。
#[derive(Debug, Clone)]
pub struct DocumentModel {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for DocumentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentModel {
    /// 创建只包含根节点的空文档
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// 元素名称，非元素节点返回 `None`
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => Some(e.name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    /// 判断节点是否为给定名称之一的元素
    pub fn is_named(&self, id: NodeId, names: &[&str]) -> bool {
        self.name(id).is_some_and(|n| names.contains(&n))
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => &e.attrs,
            _ => &[],
        }
    }

    /// 读取第一个同名属性的值
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(e) = &mut self.nodes[id.0].data {
            match e.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => e.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.retain_attrs(id, |k, _| k != name);
    }

    /// 只保留满足条件的属性，条件参数为（属性名, 属性值）
    pub fn retain_attrs<F>(&mut self, id: NodeId, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        if let NodeData::Element(e) = &mut self.nodes[id.0].data {
            e.attrs.retain(|(k, v)| keep(k, v));
        }
    }

    /// 修改元素名称，属性和子节点保持不变
    pub fn rename(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(e) = &mut self.nodes[id.0].data {
            e.name = name.to_ascii_lowercase();
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// 子节点，按文档顺序
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.child_iter(id).collect()
    }

    fn child_iter(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].first_child, move |c| {
            self.nodes[c.0].next_sibling
        })
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.child_iter(id).filter(|c| self.is_element(*c)).collect()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].last_child
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    /// 前面的兄弟元素，按文档顺序
    pub fn prev_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> =
            std::iter::successors(self.prev_sibling(id), |s| self.prev_sibling(*s))
                .filter(|s| self.is_element(*s))
                .collect();
        out.reverse();
        out
    }

    /// 文本节点的内容
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(t) = &mut self.nodes[id.0].data {
            *t = text.to_string();
        }
    }

    /// 节点及其所有后代的文本内容
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text_of(id) {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.text_of(d) {
                out.push_str(t);
            }
        }
        out
    }

    /// 前序遍历的后代节点（不含自身）
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.first_child(id);
        while let Some(n) = current {
            out.push(n);
            current = self.next_in_order(n, id);
        }
        out
    }

    /// `scope` 子树内前序遍历的下一个节点
    fn next_in_order(&self, node: NodeId, scope: NodeId) -> Option<NodeId> {
        if let Some(c) = self.first_child(node) {
            return Some(c);
        }
        let mut current = node;
        while current != scope {
            if let Some(s) = self.next_sibling(current) {
                return Some(s);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// 按文档顺序访问元素，访问过程中可以修改文档
    ///
    /// 访问函数可以移除或解包当前元素，也可以移除它的兄弟节点。
    /// 被移除的子树不再访问，被解包元素的子节点继续访问。
    pub fn walk_elements<F>(&mut self, visit: F)
    where
        F: FnMut(&mut DocumentModel, NodeId),
    {
        self.walk_elements_within(self.root, visit);
    }

    /// 同 [`walk_elements`](Self::walk_elements)，只访问 `scope` 的后代
    pub fn walk_elements_within<F>(&mut self, scope: NodeId, mut visit: F)
    where
        F: FnMut(&mut DocumentModel, NodeId),
    {
        let mut stack = self.children_rev(scope);
        while let Some(node) = stack.pop() {
            if self.parent(node).is_none() || !self.is_element(node) {
                continue;
            }
            let before = self.children(node);
            visit(self, node);
            if self.parent(node).is_some() {
                stack.extend(self.children_rev(node));
            } else {
                // 解包后子节点换了父节点，移除后仍指向原节点
                stack.extend(
                    before
                        .into_iter()
                        .rev()
                        .filter(|c| self.parent(*c).is_some_and(|p| p != node)),
                );
            }
        }
    }

    fn children_rev(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.last_child(id), |c| self.prev_sibling(*c)).collect()
    }

    /// 文档中所有可达的元素，按文档顺序
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .collect()
    }

    /// 按元素名选择节点，按文档顺序
    pub fn select(&self, names: &[&str]) -> Vec<NodeId> {
        self.select_within(self.root, names)
    }

    pub fn select_within(&self, scope: NodeId, names: &[&str]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.is_named(*n, names))
            .collect()
    }

    /// 按属性选择元素，条件参数为属性值
    pub fn select_by_attr<F>(&self, attr: &str, matches: F) -> Vec<NodeId>
    where
        F: Fn(&str) -> bool,
    {
        self.elements()
            .into_iter()
            .filter(|n| self.attr(*n, attr).is_some_and(&matches))
            .collect()
    }

    pub fn find_first(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.name(*n) == Some(name))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.find_first("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first("body")
    }

    /// 节点是否仍可从根节点到达
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// 是否存在给定名称的祖先元素
    pub fn has_ancestor(&self, id: NodeId, name: &str) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if self.name(p) == Some(name) {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    pub fn create_element(&mut self, name: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeData::Element(ElementData {
            name: name.to_ascii_lowercase(),
            attrs,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        let prev = self.nodes[id.0].prev_sibling.take();
        let next = self.nodes[id.0].next_sibling.take();
        match prev {
            Some(p) => self.nodes[p.0].next_sibling = next,
            None => self.nodes[parent.0].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n.0].prev_sibling = prev,
            None => self.nodes[parent.0].last_child = prev,
        }
    }

    /// 追加子节点，子节点先从原位置分离
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if child == self.root {
            return;
        }
        self.detach(child);
        let last = self.nodes[parent.0].last_child;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = last;
        match last {
            Some(l) => self.nodes[l.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);
    }

    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        if node == self.root || node == sibling {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        let prev = self.nodes[sibling.0].prev_sibling;
        self.nodes[node.0].parent = Some(parent);
        self.nodes[node.0].prev_sibling = prev;
        self.nodes[node.0].next_sibling = Some(sibling);
        self.nodes[sibling.0].prev_sibling = Some(node);
        match prev {
            Some(p) => self.nodes[p.0].next_sibling = Some(node),
            None => self.nodes[parent.0].first_child = Some(node),
        }
    }

    /// 移除节点及其整个子树
    pub fn remove(&mut self, id: NodeId) {
        if id != self.root {
            self.detach(id);
        }
    }

    /// 移除元素本身，子节点提升到原位置；没有子节点时直接移除
    pub fn unwrap(&mut self, id: NodeId) {
        if id == self.root || self.parent(id).is_none() {
            return;
        }
        while let Some(c) = self.first_child(id) {
            self.insert_before(id, c);
        }
        self.detach(id);
    }

    /// 用一个新节点替换旧节点
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.replace_with_nodes(old, vec![new]);
    }

    pub fn replace_with_nodes(&mut self, old: NodeId, new: Vec<NodeId>) {
        if old == self.root {
            return;
        }
        for n in &new {
            self.insert_before(old, *n);
        }
        self.detach(old);
    }

    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(c) = self.first_child(id) {
            self.detach(c);
        }
    }

    /// 用解析后的HTML片段替换节点的所有子节点
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        self.append_html(id, html);
    }

    pub fn append_html(&mut self, id: NodeId, html: &str) {
        for n in self.parse_fragment(html) {
            self.append(id, n);
        }
    }

    /// 从另一个文档深拷贝子树到本文档，返回未挂载的新节点
    pub fn import(&mut self, other: &DocumentModel, id: NodeId) -> NodeId {
        let copy = self.push(other.data(id).clone());
        let mut stack = vec![(id, copy)];
        while let Some((source, target)) = stack.pop() {
            for child in other.child_iter(source) {
                let c = self.push(other.data(child).clone());
                self.append(target, c);
                stack.push((child, c));
            }
        }
        copy
    }

    /// 合并相邻的文本节点并移除空文本节点
    pub fn merge_text_nodes(&mut self) {
        for id in std::iter::once(self.root).chain(self.descendants(self.root)) {
            let mut previous_text: Option<NodeId> = None;
            let mut current = self.first_child(id);
            while let Some(c) = current {
                current = self.next_sibling(c);
                let Some(t) = self.text_of(c).map(str::to_string) else {
                    previous_text = None;
                    continue;
                };
                if t.is_empty() {
                    self.detach(c);
                    continue;
                }
                match previous_text {
                    Some(p) => {
                        if let NodeData::Text(pt) = &mut self.nodes[p.0].data {
                            pt.push_str(&t);
                        }
                        self.detach(c);
                    }
                    None => previous_text = Some(c),
                }
            }
        }
    }

    /// 子节点序列化结果
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_children(self, id, &mut out);
        out
    }

    /// 节点本身及其子树的序列化结果
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    /// 整个文档的序列化结果
    pub fn html(&self) -> String {
        self.inner_html(self.root)
    }

    /// `<html>` 元素的内部HTML，文档没有 `<html>` 时返回空字符串
    pub fn document_html(&self) -> String {
        self.find_first("html")
            .map(|h| self.inner_html(h))
            .unwrap_or_default()
    }

    /// `<body>` 元素的内部HTML
    pub fn body_html(&self) -> String {
        self.body().map(|b| self.inner_html(b)).unwrap_or_default()
    }

    /// `<body>` 元素的文本内容
    pub fn body_text(&self) -> String {
        self.body().map(|b| self.text(b)).unwrap_or_default()
    }
}
