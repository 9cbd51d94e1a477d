// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::debug;

use super::{append_text_element, find_by_class, has_class, replace_body, SiteExtractor};
use crate::document::{DocumentModel, NodeId};
use crate::domain::models::task::Task;
use crate::pipeline::Outcome;

const HOSTS: &[&str] = &[
    "stackoverflow.com",
    "stackexchange.com",
    "superuser.com",
    "serverfault.com",
    "askubuntu.com",
    "mathoverflow.net",
];

const POST_BODY: &str = "js-post-body";

/// StackExchange 系列站点：问题、采纳的回答和其他回答合并为一篇文章
#[derive(Debug, Default)]
pub struct StackExchangeExtractor;

/// `container` class 的元素内的帖子正文
fn post_bodies(doc: &DocumentModel, container: &str) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|n| has_class(doc, *n, container))
        .flat_map(|n| find_by_class(doc, n, POST_BODY).into_iter().take(1))
        .collect()
}

impl SiteExtractor for StackExchangeExtractor {
    fn matches(&self, host: &str) -> bool {
        HOSTS.contains(&host) || host.ends_with(".stackexchange.com")
    }

    fn apply(&self, task: &mut Task) -> Outcome {
        debug!(task = %task.id, module = "specific", src = %task.content_url(), "Apply stackoverflow");

        let Some(doc) = task.document.as_mut() else {
            return Outcome::Continue;
        };
        let source = doc.clone();

        let Some(question) = post_bodies(&source, "question").first().copied() else {
            // 没有找到问题时保持原样
            return Outcome::Continue;
        };
        let accepted = post_bodies(&source, "accepted-answer").first().copied();
        let others: Vec<NodeId> = post_bodies(&source, "answer")
            .into_iter()
            .filter(|a| Some(*a) != accepted)
            .collect();

        let Some(article) = replace_body(doc) else {
            return Outcome::Continue;
        };
        append_text_element(doc, article, "h2", "Question");
        let copy = doc.import(&source, question);
        doc.append(article, copy);

        let mut count = 0;
        if let Some(answer) = accepted {
            count += 1;
            append_post(doc, article, "Accepted Answer", &source, answer);
        }
        for answer in others {
            count += 1;
            append_post(doc, article, &format!("Answer #{}", count), &source, answer);
        }
        debug!(task = %task.id, module = "specific", answers = count, "Assembled question and answers");

        Outcome::Continue
    }

    fn name(&self) -> &'static str {
        "stackexchange"
    }
}

fn append_post(
    doc: &mut DocumentModel,
    article: NodeId,
    heading: &str,
    source: &DocumentModel,
    post: NodeId,
) {
    let hr = doc.create_element("hr", Vec::new());
    doc.append(article, hr);
    append_text_element(doc, article, "h2", heading);
    let copy = doc.import(source, post);
    doc.append(article, copy);
}
