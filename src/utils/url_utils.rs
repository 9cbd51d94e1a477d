// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{ParseError, Url};

/// 资源存储URL前缀
pub const STORE_PREFIX: &str = "store://";

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 去掉 `www.` 前缀的主机名
pub fn site_host(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| h.strip_prefix("www.").unwrap_or(h).to_string())
}

/// 为存储键构建 `store://` URL
pub fn store_url(key: &str) -> String {
    format!("{}{}", STORE_PREFIX, key)
}

/// 从 `store://` URL 中取出存储键，其他URL返回 `None`
pub fn parse_store_key(url: &str) -> Option<&str> {
    url.strip_prefix(STORE_PREFIX).filter(|k| !k.is_empty())
}

// 匹配文本中嵌入的URL
static EMBEDDED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b((?:[a-z][\w-]+:(?:/{1,3}|[a-z0-9%])|www\d{0,3}[.]|[a-z0-9.\-]+[.][a-z]{2,4}/)(?:[^\s()<>]+|\(([^\s()<>]+|(\([^\s()<>]+\)))*\))+(?:\(([^\s()<>]+|(\([^\s()<>]+\)))*\)|[^\s`!()\[\]{};:'".,<>?«»“”‘’]))"#,
    )
    .expect("valid embedded url pattern")
});

/// 查找字符串中出现的第一个URL
pub fn find_embedded_url(s: &str) -> Option<&str> {
    EMBEDDED_URL.find(s).map(|m| m.as_str())
}

/// 规范化 `href`/`src` 属性值
///
/// 去掉首尾空白；值中包含空白等非法字符时，尝试从中取出嵌入的URL；
/// 都不可用时返回空字符串。
pub fn normalize_link(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if is_well_formed(raw) {
        return raw.to_string();
    }
    find_embedded_url(raw).map(str::to_string).unwrap_or_default()
}

// 不含空白，且第一个路径段中的冒号前是合法的协议名
fn is_well_formed(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let first_segment = raw.split(['/', '?', '#']).next().unwrap_or_default();
    !first_segment.contains(':') || scheme_of(raw).is_some()
}

/// URL的协议部分（小写），相对URL返回 `None`
pub fn scheme_of(raw: &str) -> Option<String> {
    let colon = raw.find(':')?;
    let candidate = &raw[..colon];
    let mut chars = candidate.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| candidate.to_ascii_lowercase())
}
