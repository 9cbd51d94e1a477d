// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{Html, Node};

use super::{DocumentModel, ElementData, NodeData, NodeId};

impl DocumentModel {
    /// 解析完整的HTML文档
    ///
    /// 解析器对任何输入都会产出一棵树，缺失的 `<html>`、`<head>`、`<body>` 会被补齐。
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = DocumentModel::new();
        let root = doc.root;
        doc.copy_tree(&parsed, false, Some(root));
        doc
    }

    /// 在本文档的节点区中解析HTML片段，返回未挂载的顶层节点
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let parsed = Html::parse_fragment(html);
        self.copy_tree(&parsed, true, None)
    }

    fn copy_tree(&mut self, parsed: &Html, fragment: bool, attach_to: Option<NodeId>) -> Vec<NodeId> {
        let tree_root = parsed.tree.root();
        let start = if fragment {
            // 片段解析的结果包裹在一个 <html> 元素中
            tree_root
                .children()
                .find(|c| matches!(c.value(), Node::Element(e) if e.name() == "html"))
                .unwrap_or(tree_root)
        } else {
            tree_root
        };

        let mut top = Vec::new();
        let mut stack = Vec::new();
        for child in start.children().collect::<Vec<_>>().into_iter().rev() {
            stack.push((child, attach_to));
        }

        while let Some((node, parent)) = stack.pop() {
            let data = match node.value() {
                Node::Element(e) => NodeData::Element(ElementData {
                    name: e.name().to_string(),
                    attrs: e
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                }),
                Node::Text(t) => NodeData::Text(String::from(&**t)),
                Node::Comment(c) => NodeData::Comment(String::from(&**c)),
                Node::Doctype(d) => NodeData::Doctype(d.name().to_string()),
                _ => continue,
            };
            let id = self.push(data);
            match parent {
                Some(p) => self.append(p, id),
                None => top.push(id),
            }
            for child in node.children().collect::<Vec<_>>().into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }
        top
    }
}
