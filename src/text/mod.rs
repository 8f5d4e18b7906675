//! Plain-text helpers over manuscript HTML.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Strip markup, leaving tag boundaries as whitespace so adjacent blocks don't merge.
pub fn strip_html(html: &str) -> String {
    TAG_RE.replace_all(html, " ").replace("&nbsp;", " ")
}

/// Count whitespace-delimited words in HTML content. Empty or tag-only content counts as 0.
pub fn count_words(html: &str) -> i32 {
    let words = strip_html(html).split_whitespace().count();
    i32::try_from(words).unwrap_or(i32::MAX)
}
