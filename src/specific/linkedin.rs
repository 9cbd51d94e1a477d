// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::{debug, info, warn};

use super::{append_text_element, find_by_class, has_class, has_class_where, replace_body, SiteExtractor};
use crate::document::{DocumentModel, NodeId};
use crate::domain::models::task::Task;
use crate::pipeline::Outcome;

// 分享的文章或动态所在 div 的 class 前缀
const ARTICLE_CLASS: &str = "share-article";
const POST_CLASS: &str = "share-update-card";
const ARTICLE_LINK_CLASS: &str = "mini-card__title-link";

/// linkedin.com 的分享页面
///
/// 分享文章时页面只是落地页，真正的文章需要以新URL重新抓取；
/// 分享普通动态时，动态本身作为正文。
#[derive(Debug, Default)]
pub struct LinkedinExtractor;

#[derive(Debug, PartialEq, Eq)]
enum Shared {
    Article,
    Post,
    Nothing,
}

fn classify(doc: &DocumentModel) -> Shared {
    let divs = doc.select(&["div"]);
    if divs
        .iter()
        .any(|d| has_class_where(doc, *d, |c| c.starts_with(ARTICLE_CLASS)))
    {
        return Shared::Article;
    }
    if divs
        .iter()
        .any(|d| has_class_where(doc, *d, |c| c.starts_with(POST_CLASS)))
    {
        return Shared::Post;
    }
    Shared::Nothing
}

fn first_div_with_class(doc: &DocumentModel, class: &str) -> Option<NodeId> {
    doc.select(&["div"])
        .into_iter()
        .find(|d| has_class(doc, *d, class))
}

/// 分享文章的链接地址
fn article_link(doc: &DocumentModel) -> Option<String> {
    let container = first_div_with_class(doc, ARTICLE_CLASS)?;
    find_by_class(doc, container, ARTICLE_LINK_CLASS)
        .into_iter()
        .filter(|a| doc.is_named(*a, &["a"]))
        .find_map(|a| doc.attr(a, "href").filter(|h| !h.trim().is_empty()))
        .map(|h| h.trim().to_string())
}

/// 用发布者的名字作为标题
fn post_author(doc: &DocumentModel, post: NodeId) -> Option<String> {
    doc.select_within(post, &["header"])
        .into_iter()
        .flat_map(|h| doc.select_within(h, &["a"]))
        .map(|a| doc.text(a).trim().to_string())
        .find(|t| !t.is_empty())
}

fn set_document_title(doc: &mut DocumentModel, title: &str) {
    if let Some(existing) = doc.find_first("title") {
        doc.clear_children(existing);
        let text = doc.create_text(title);
        doc.append(existing, text);
    } else if let Some(head) = doc.head() {
        append_text_element(doc, head, "title", title);
    }
}

impl LinkedinExtractor {
    fn shared_article(&self, task: &Task) -> Outcome {
        let Some(href) = task.document.as_ref().and_then(article_link) else {
            warn!(task = %task.id, module = "specific", src = %task.content_url(), "Shared article without link");
            return Outcome::Continue;
        };
        match task.resolve_url(&href) {
            Ok(url) => {
                debug!(task = %task.id, module = "specific", src = %task.content_url(), url = %url, "Found article URL in linkedin post");
                Outcome::Restart(url)
            }
            Err(e) => {
                warn!(task = %task.id, module = "specific", href = %href, error = %e, "Failed to resolve shared article URL");
                Outcome::Continue
            }
        }
    }

    fn shared_post(&self, task: &mut Task) -> Outcome {
        let Some(doc) = task.document.as_mut() else {
            return Outcome::Continue;
        };
        let source = doc.clone();
        let Some(post) = first_div_with_class(&source, POST_CLASS) else {
            return Outcome::Continue;
        };
        let Some(article) = replace_body(doc) else {
            return Outcome::Continue;
        };

        let title = post_author(&source, post);
        if let Some(title) = &title {
            append_text_element(doc, article, "h1", title);
            set_document_title(doc, title);
        }
        let copy = doc.import(&source, post);
        doc.append(article, copy);

        if let Some(title) = title {
            task.title = title;
        }
        debug!(task = %task.id, module = "specific", src = %task.content_url(), "Found linkedin post");
        Outcome::Continue
    }
}

impl SiteExtractor for LinkedinExtractor {
    fn matches(&self, host: &str) -> bool {
        host == "linkedin.com"
    }

    fn apply(&self, task: &mut Task) -> Outcome {
        debug!(task = %task.id, module = "specific", src = %task.content_url(), "Apply linkedin");

        let shared = task
            .document
            .as_ref()
            .map(classify)
            .unwrap_or(Shared::Nothing);
        match shared {
            Shared::Article => {
                info!(task = %task.id, module = "specific", "Found shared article");
                self.shared_article(task)
            }
            Shared::Post => {
                info!(task = %task.id, module = "specific", "Found shared post");
                self.shared_post(task)
            }
            Shared::Nothing => Outcome::Continue,
        }
    }

    fn name(&self) -> &'static str {
        "linkedin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::testing::new_task;

    #[test]
    fn test_shared_article_restarts_with_article_url() {
        // Given: 分享文章的落地页
        let mut task = new_task("https://www.linkedin.com/posts/someone_activity-1");
        task.set_html(
            r#"<html><body><div class="share-article share-article--x">
            <a class="mini-card__title-link" href="">empty</a>
            <a class="app-aware-link mini-card__title-link" href="https://buff.ly/abc">Article</a>
            </div></body></html>"#,
        );

        // When: 应用提取器
        let outcome = LinkedinExtractor.apply(&mut task);

        // Then: 请求以文章地址重启
        match outcome {
            Outcome::Restart(url) => assert_eq!(url, "https://buff.ly/abc"),
            other => panic!("expected restart, got {:?}", other),
        }
    }

    #[test]
    fn test_shared_post_becomes_content() {
        let mut task = new_task("https://www.linkedin.com/posts/someone_activity-2");
        task.set_html(
            r#"<html><head><title>LinkedIn</title></head><body>
            <nav>Feed</nav>
            <div class="share-update-card">
              <header><a href="/in/jane"> Jane Doe </a></header>
              <p>Post text.</p>
            </div></body></html>"#,
        );

        let outcome = LinkedinExtractor.apply(&mut task);

        assert!(matches!(outcome, Outcome::Continue));
        assert_eq!(task.title, "Jane Doe");
        let doc = task.document.as_ref().unwrap();
        let body = doc.body_html();
        assert!(body.starts_with("<article><h1>Jane Doe</h1><div class=\"share-update-card\">"));
        assert!(body.contains("Post text."));
        assert!(!body.contains("Feed"));
        let title = doc.find_first("title").unwrap();
        assert_eq!(doc.text(title), "Jane Doe");
    }

    #[test]
    fn test_other_pages_are_unchanged() {
        let mut task = new_task("https://www.linkedin.com/in/jane");
        task.set_html("<html><body><div class=\"profile\">x</div></body></html>");
        assert!(matches!(LinkedinExtractor.apply(&mut task), Outcome::Continue));
        assert!(task.document.as_ref().unwrap().body_html().contains("profile"));
    }
}
