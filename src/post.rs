//! Delimited text format exchanged with the language model.
//!
//! The model is asked to answer with three sections in a fixed order:
//!
//! ```text
//! [标题开始]
//! title
//! [标题结束]
//! [正文开始]
//! body
//! [正文结束]
//! [标签开始]
//! #tag1 #tag2 #tag3
//! [标签结束]
//! ```
//!
//! A reply missing any start/end pair is not a post.

use crate::models::GeneratedPost;
use tracing::warn;

pub const TITLE_START: &str = "[标题开始]";
pub const TITLE_END: &str = "[标题结束]";
pub const BODY_START: &str = "[正文开始]";
pub const BODY_END: &str = "[正文结束]";
pub const TAGS_START: &str = "[标签开始]";
pub const TAGS_END: &str = "[标签结束]";

/// First character of every tag.
pub const TAG_MARKER: char = '#';

/// Text between `start` and the first `end` that follows it, trimmed.
fn section<'a>(raw: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = raw.find(start)? + start.len();
    let len = raw[from..].find(end)?;
    Some(raw[from..from + len].trim())
}

/// Parse a model reply into a [`GeneratedPost`].
///
/// Text outside the delimiters, such as a greeting before the title, is
/// ignored. Each section is trimmed.
///
/// # Arguments
/// * `raw` - The model's full reply
///
/// # Returns
/// `None` when any of the three delimiter pairs is missing. Tags are the
/// whitespace-separated tokens of the tag section that start with `#`; other
/// tokens are dropped.
pub fn parse_post(raw: &str) -> Option<GeneratedPost> {
    let Some(title) = section(raw, TITLE_START, TITLE_END) else {
        warn!("Reply has no title section");
        return None;
    };
    let Some(content) = section(raw, BODY_START, BODY_END) else {
        warn!("Reply has no body section");
        return None;
    };
    let Some(tags) = section(raw, TAGS_START, TAGS_END) else {
        warn!("Reply has no tag section");
        return None;
    };

    Some(GeneratedPost {
        title: title.to_string(),
        content: content.to_string(),
        tags: tags
            .split_whitespace()
            .filter(|t| t.starts_with(TAG_MARKER))
            .map(str::to_string)
            .collect(),
    })
}

/// Write a post in the delimited reply format.
///
/// Tags are joined with single spaces, so [`parse_post`] reads the same post
/// back.
pub fn render_post(post: &GeneratedPost) -> String {
    format!(
        "{TITLE_START}\n{}\n{TITLE_END}\n{BODY_START}\n{}\n{BODY_END}\n{TAGS_START}\n{}\n{TAGS_END}\n",
        post.title,
        post.content,
        post.tags.join(" ")
    )
}
