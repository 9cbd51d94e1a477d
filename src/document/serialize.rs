// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{DocumentModel, NodeData, NodeId};

/// 没有结束标签的元素
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// 内容按原文输出、不做转义的元素
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

// 解析器会丢弃这些元素开始标签后的第一个换行
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// 序列化节点及其子树
///
/// 使用显式栈，嵌套深度不受调用栈限制。
pub(super) fn write_node(doc: &DocumentModel, id: NodeId, out: &mut String) {
    write_steps(doc, vec![Step::Open(id)], out);
}

/// 按顺序序列化节点的所有子节点
pub(super) fn write_children(doc: &DocumentModel, id: NodeId, out: &mut String) {
    write_steps(doc, open_children(doc, id), out);
}

fn open_children(doc: &DocumentModel, id: NodeId) -> Vec<Step> {
    let mut steps: Vec<Step> = doc.children(id).into_iter().map(Step::Open).collect();
    steps.reverse();
    steps
}

fn write_steps(doc: &DocumentModel, mut stack: Vec<Step>, out: &mut String) {
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Close(id) => {
                if let Some(name) = doc.name(id) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                continue;
            }
            Step::Open(id) => id,
        };

        match doc.data(id) {
            NodeData::Document => stack.extend(open_children(doc, id)),
            NodeData::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                let raw = doc
                    .parent(id)
                    .is_some_and(|p| doc.is_named(p, RAW_TEXT_ELEMENTS));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                for (k, v) in &e.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(v));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&e.name.as_str()) {
                    continue;
                }
                if LEADING_NEWLINE_ELEMENTS.contains(&e.name.as_str())
                    && doc
                        .first_child(id)
                        .and_then(|c| doc.text_of(c))
                        .is_some_and(|t| t.starts_with('\n'))
                {
                    out.push('\n');
                }
                stack.push(Step::Close(id));
                stack.extend(open_children(doc, id));
            }
        }
    }
}
