// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 声明式DOM规则引擎
//!
//! - [`RuleSet`]：元素白名单、解包（灰名单）集合和属性白名单，作为不可变配置注入
//! - [`PatternRules`]：从YAML加载的模式规则，按元素名和属性值选择元素后删除或解包

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::document::{DocumentModel, NodeId};
use crate::utils::errors::RuleError;

/// 内置的预处理规则
const PREPARE_RULES: &str = include_str!("rules/prepare.yaml");

/// 模式规则永远不会选中的元素
const PROTECTED_ELEMENTS: &[&str] = &["html", "body", "main", "article"];

const DEFAULT_ALLOWED: &[&str] = &[
    "html", "body", "p", "a", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "b", "u", "i", "s",
    "em", "strong", "small", "sub", "sup", "abbr", "del", "ins", "aside", "ul", "ol", "li", "dl",
    "dd", "dt", "table", "thead", "tbody", "tfoot", "caption", "tr", "th", "td", "colgroup", "col",
    "code", "pre", "kbd", "samp", "var", "mark", "q", "rp", "rt", "rtc", "ruby", "blockquote",
    "cite", "img", "figure", "figcaption", "bdi", "bdo", "time", "wbr",
];

const DEFAULT_UNWRAP: &[&str] = &[
    "span", "div", "article", "section", "summary", "address", "main", "footer", "header",
    "hgroup", "data", "dfn", // deprecated
    "acronym", "basefont", "big", "blink", "center", "content", "font", "listing", "marquee",
    "nobr", "plaintext", "spacer", "strike", "tt", "picture",
];

const DEFAULT_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("img", &["src", "width", "height", "alt", "title"]),
    ("a", &["href", "title"]),
];

/// 元素与属性白名单
///
/// 解包集合中的元素在清理时去掉标签但保留文本；
/// 既不在白名单也不在解包集合中的元素连同内容一起删除。
#[derive(Debug, Clone)]
pub struct RuleSet {
    allowed: HashSet<String>,
    unwrap: HashSet<String>,
    attributes: HashMap<String, HashSet<String>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED.iter().copied(),
            DEFAULT_UNWRAP.iter().copied(),
            DEFAULT_ATTRIBUTES
                .iter()
                .map(|(tag, attrs)| (*tag, attrs.iter().copied())),
        )
    }
}

impl RuleSet {
    /// 创建规则集
    ///
    /// # 参数
    ///
    /// * `allowed` - 保留的元素名
    /// * `unwrap` - 解包的元素名
    /// * `attributes` - 元素名到允许属性名的映射
    pub fn new<'a, A, U, M, I>(allowed: A, unwrap: U, attributes: M) -> Self
    where
        A: IntoIterator<Item = &'a str>,
        U: IntoIterator<Item = &'a str>,
        M: IntoIterator<Item = (&'a str, I)>,
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            allowed: allowed.into_iter().map(str::to_string).collect(),
            unwrap: unwrap.into_iter().map(str::to_string).collect(),
            attributes: attributes
                .into_iter()
                .map(|(tag, attrs)| {
                    (
                        tag.to_string(),
                        attrs.into_iter().map(str::to_string).collect(),
                    )
                })
                .collect(),
        }
    }

    /// 元素是否可以出现在清理后的内容中（包括解包集合）
    pub fn is_allowed(&self, tag: &str) -> bool {
        self.allowed.contains(tag) || self.unwrap.contains(tag)
    }

    /// 元素是否原样保留（不含解包集合）
    pub fn is_kept(&self, tag: &str) -> bool {
        self.allowed.contains(tag)
    }

    pub fn is_unwrap(&self, tag: &str) -> bool {
        self.unwrap.contains(tag)
    }

    pub fn is_attr_allowed(&self, tag: &str, attr: &str) -> bool {
        self.attributes
            .get(tag)
            .is_some_and(|attrs| attrs.contains(attr))
    }

    /// 删除所有不被允许的元素及其内容
    pub fn remove_disallowed(&self, doc: &mut DocumentModel) -> usize {
        let mut removed = 0;
        doc.walk_elements(|doc, node| {
            let allowed = doc.name(node).is_some_and(|n| self.is_allowed(n));
            if !allowed {
                doc.remove(node);
                removed += 1;
            }
        });
        removed
    }

    /// 解包解包集合中的所有元素
    pub fn unwrap_grey(&self, doc: &mut DocumentModel) -> usize {
        let mut unwrapped = 0;
        doc.walk_elements(|doc, node| {
            if doc.name(node).is_some_and(|n| self.is_unwrap(n)) {
                doc.unwrap(node);
                unwrapped += 1;
            }
        });
        unwrapped
    }

    /// 删除属性白名单之外的所有属性
    pub fn strip_attributes(&self, doc: &mut DocumentModel) {
        for node in doc.elements() {
            let Some(tag) = doc.name(node).map(str::to_string) else {
                continue;
            };
            doc.retain_attrs(node, |attr, _| self.is_attr_allowed(&tag, attr));
        }
    }
}

/// 规则动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// 删除元素及其内容
    Drop,
    /// 删除元素但保留内容，空元素直接删除
    Unwrap,
}

/// 规则文件中的一条记录
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub action: RuleAction,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// 编译后的模式规则
#[derive(Debug, Clone)]
pub struct PatternRule {
    action: RuleAction,
    elements: Vec<String>,
    attr: Option<String>,
    patterns: Vec<Regex>,
}

impl PatternRule {
    /// 编译规则，无效的正则表达式记录警告后跳过
    ///
    /// 所有模式都无效时返回 `None`，避免规则退化为只按属性存在与否匹配
    pub fn compile(config: RuleConfig) -> Option<Self> {
        let mut patterns = Vec::with_capacity(config.values.len());
        for value in &config.values {
            match Regex::new(value) {
                Ok(re) => patterns.push(re),
                Err(e) => warn!(
                    module = "rules",
                    pattern = %value,
                    error = %e,
                    "Skipping malformed rule pattern"
                ),
            }
        }
        if !config.values.is_empty() && patterns.is_empty() {
            return None;
        }

        Some(Self {
            action: config.action,
            elements: config
                .elements
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            attr: config.attr.map(|a| a.to_ascii_lowercase()),
            patterns,
        })
    }

    fn selects_element(&self, tag: &str) -> bool {
        !PROTECTED_ELEMENTS.contains(&tag)
            && (self.elements.is_empty() || self.elements.iter().any(|e| e == tag))
    }

    fn value_matches(&self, value: &str) -> Option<&Regex> {
        let attr = self.attr.as_deref()?;
        if attr == "class" {
            value
                .split_whitespace()
                .find_map(|token| self.patterns.iter().find(|re| re.is_match(token)))
        } else {
            self.patterns.iter().find(|re| re.is_match(value))
        }
    }

    /// 判断元素是否被规则选中
    pub fn matches(&self, doc: &DocumentModel, node: NodeId) -> bool {
        let Some(tag) = doc.name(node) else {
            return false;
        };
        if !self.selects_element(tag) {
            return false;
        }
        let Some(attr) = self.attr.as_deref() else {
            return true;
        };
        let Some(value) = doc.attr(node, attr) else {
            return false;
        };
        if self.patterns.is_empty() {
            return true;
        }
        match self.value_matches(value) {
            Some(re) => {
                debug!(
                    module = "rules",
                    action = ?self.action,
                    tag = tag,
                    attribute = attr,
                    value = value,
                    matches = re.as_str(),
                    "Rule matched"
                );
                true
            }
            None => false,
        }
    }

    /// 对文档应用规则，返回受影响的元素数
    pub fn apply(&self, doc: &mut DocumentModel) -> usize {
        let mut affected = 0;
        // 祖先已被删除的元素不再访问
        doc.walk_elements(|doc, node| {
            if !self.matches(doc, node) {
                return;
            }
            match self.action {
                RuleAction::Drop => doc.remove(node),
                RuleAction::Unwrap => doc.unwrap(node),
            }
            affected += 1;
        });
        affected
    }
}

/// 一组模式规则，加载后不可变
#[derive(Debug, Clone, Default)]
pub struct PatternRules {
    rules: Vec<PatternRule>,
}

impl PatternRules {
    /// 从YAML文本加载规则
    ///
    /// 文本整体无法解析时返回错误；单条无效的模式只记录警告
    pub fn from_yaml(source: &str) -> Result<Self, RuleError> {
        let configs: Vec<RuleConfig> = serde_yaml::from_str(source)?;
        let rules = configs
            .into_iter()
            .filter_map(PatternRule::compile)
            .collect();
        Ok(Self { rules })
    }

    /// 内置的预处理规则
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_yaml(PREPARE_RULES)
    }

    /// 从文件加载规则，未指定路径时使用内置规则
    pub fn load(path: Option<&str>) -> Result<Self, RuleError> {
        match path {
            Some(path) => {
                info!(module = "rules", path = path, "Load rules from file");
                Self::from_yaml(&std::fs::read_to_string(path)?)
            }
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按顺序应用所有规则，返回受影响的元素总数
    pub fn apply(&self, doc: &mut DocumentModel) -> usize {
        debug!(module = "rules", count = self.rules.len(), "Apply rules");
        self.rules.iter().map(|rule| rule.apply(doc)).sum()
    }
}
