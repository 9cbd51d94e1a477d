// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;

fn body(html: &str) -> DocumentModel {
    DocumentModel::parse(&format!("<html><body>{}</body></html>", html))
}

#[test]
fn test_parse_adds_missing_structure() {
    let doc = DocumentModel::parse("<p>hello</p>");
    assert!(doc.head().is_some());
    assert!(doc.body().is_some());
    assert_eq!(doc.body_html(), "<p>hello</p>");
}

#[test]
fn test_void_elements_serialize_without_end_tag() {
    let doc = body(r#"<p><img src="x"><br></p>"#);
    assert_eq!(doc.body_html(), r#"<p><img src="x"><br></p>"#);
}

#[test]
fn test_text_and_attributes_are_escaped() {
    let doc = body(r#"<a href="/?a=1&amp;b=&quot;2&quot;">1 &lt; 2 &amp; 3</a>"#);
    assert_eq!(
        doc.body_html(),
        r#"<a href="/?a=1&amp;b=&quot;2&quot;">1 &lt; 2 &amp; 3</a>"#
    );
}

#[test]
fn test_serialization_is_stable_after_reparse() {
    let source = r#"<div class="a"><p>one <b>two</b></p><!-- note --><script>if (a < b) {}</script></div>"#;
    let first = body(source).body_html();
    let second = body(&first).body_html();
    assert_eq!(first, second);
}

#[test]
fn test_unwrap_promotes_children() {
    let mut doc = body("<div><span>a<b>b</b></span>c</div>");
    let span = doc.select(&["span"])[0];
    doc.unwrap(span);
    assert_eq!(doc.body_html(), "<div>a<b>b</b>c</div>");
}

#[test]
fn test_unwrap_childless_node_removes_it() {
    let mut doc = body("<p>prefix <span></span> suffix</p>");
    let span = doc.select(&["span"])[0];
    doc.unwrap(span);
    assert_eq!(doc.body_html(), "<p>prefix  suffix</p>");
    assert!(!doc.is_attached(span));
}

#[test]
fn test_remove_and_is_attached() {
    let mut doc = body("<div><p>a</p><p>b</p></div>");
    let ps = doc.select(&["p"]);
    doc.remove(ps[0]);
    assert!(!doc.is_attached(ps[0]));
    assert!(doc.is_attached(ps[1]));
    assert_eq!(doc.body_html(), "<div><p>b</p></div>");
}

#[test]
fn test_root_cannot_be_removed() {
    let mut doc = body("<p>a</p>");
    let root = doc.root();
    doc.remove(root);
    doc.unwrap(root);
    assert_eq!(doc.body_html(), "<p>a</p>");
}

#[test]
fn test_replace_and_insert_before() {
    let mut doc = body("<div><p>a</p></div>");
    let p = doc.select(&["p"])[0];
    let h = doc.create_element("h2", Vec::new());
    let t = doc.create_text("title");
    doc.append(h, t);
    doc.replace(p, h);
    let hr = doc.create_element("hr", Vec::new());
    doc.insert_before(h, hr);
    assert_eq!(doc.body_html(), "<div><hr><h2>title</h2></div>");
}

#[test]
fn test_attribute_operations() {
    let mut doc = body(r#"<img src="a" alt="b" data-x="c">"#);
    let img = doc.select(&["img"])[0];
    doc.set_attr(img, "src", "z");
    doc.remove_attr(img, "alt");
    doc.retain_attrs(img, |k, _| !k.starts_with("data-"));
    assert_eq!(doc.attr(img, "src"), Some("z"));
    assert_eq!(doc.attrs(img).len(), 1);
}

#[test]
fn test_set_inner_html_parses_fragment() {
    let mut doc = body("<div>old</div>");
    let div = doc.select(&["div"])[0];
    doc.set_inner_html(div, "<em>new</em> text");
    assert_eq!(doc.inner_html(div), "<em>new</em> text");
    assert_eq!(doc.text(div), "new text");
}

#[test]
fn test_import_copies_subtree_between_documents() {
    let source = body(r#"<article><p class="x">copied</p></article>"#);
    let mut target = body("");
    let article = source.select(&["article"])[0];
    let copy = target.import(&source, article);
    let target_body = target.body().unwrap();
    target.append(target_body, copy);
    assert_eq!(target.body_html(), r#"<article><p class="x">copied</p></article>"#);
    // 源文档保持不变
    assert_eq!(source.body_html(), r#"<article><p class="x">copied</p></article>"#);
}

#[test]
fn test_merge_text_nodes() {
    let mut doc = body("<p>a<span>b</span>c</p>");
    let span = doc.select(&["span"])[0];
    doc.unwrap(span);
    doc.merge_text_nodes();
    let p = doc.select(&["p"])[0];
    assert_eq!(doc.children(p).len(), 1);
    assert_eq!(doc.text_of(doc.children(p)[0]), Some("abc"));
}

#[test]
fn test_siblings_and_ancestors() {
    let doc = body("<figure><img src=a><figcaption>c</figcaption></figure>");
    let cap = doc.select(&["figcaption"])[0];
    let img = doc.select(&["img"])[0];
    assert_eq!(doc.prev_sibling(cap), Some(img));
    assert_eq!(doc.next_sibling(img), Some(cap));
    assert!(doc.has_ancestor(cap, "figure"));
    assert!(!doc.has_ancestor(cap, "table"));
}

#[test]
fn test_leading_newline_in_pre_survives_reparse() {
    let first = body("<pre>\n\ncode</pre><textarea>\n\nnote</textarea>").body_html();
    assert_eq!(first, "<pre>\n\ncode</pre><textarea>\n\nnote</textarea>");
    assert_eq!(body(&first).body_html(), first);
}

#[test]
fn test_deep_nesting_serializes_and_imports() {
    // Given: 十万层嵌套
    let depth = 100_000;
    let doc = body(&format!("{}x{}", "<sub>".repeat(depth), "</sub>".repeat(depth)));

    // When: 序列化并深拷贝到另一个文档
    let html = doc.body_html();
    let mut target = DocumentModel::new();
    let copy = target.import(&doc, doc.body().unwrap());

    // Then: 不会栈溢出，拷贝与原文档一致
    assert_eq!(html.matches("<sub>").count(), depth);
    assert_eq!(target.inner_html(copy), html);
}

#[test]
fn test_walk_elements_skips_removed_subtrees() {
    let mut doc = body("<div><p>a</p></div><section><em>b</em></section><span>c</span>");
    let mut visited = Vec::new();

    doc.walk_elements(|doc, node| {
        let name = doc.name(node).unwrap_or_default().to_string();
        match name.as_str() {
            "div" => doc.remove(node),
            "section" => doc.unwrap(node),
            _ => {}
        }
        visited.push(name);
    });

    // 被删除的 div 的子节点不访问，被解包的 section 的子节点继续访问
    assert_eq!(
        visited,
        vec!["html", "head", "body", "div", "section", "em", "span"]
    );
    assert_eq!(doc.body_html(), "<em>b</em><span>c</span>");
}

#[test]
fn test_sibling_links_after_edits() {
    let mut doc = body("<ul><li>1</li><li>2</li><li>3</li></ul>");
    let items = doc.select(&["li"]);
    doc.remove(items[1]);
    assert_eq!(doc.next_sibling(items[0]), Some(items[2]));
    assert_eq!(doc.prev_sibling(items[2]), Some(items[0]));

    let ul = doc.select(&["ul"])[0];
    doc.remove(items[0]);
    doc.remove(items[2]);
    assert_eq!(doc.first_child(ul), None);
    assert_eq!(doc.last_child(ul), None);
    doc.append(ul, items[1]);
    assert_eq!(doc.body_html(), "<ul><li>2</li></ul>");
}
