//! Data models flowing through one pipeline run.
//!
//! - [`CandidateArticle`]: a feed entry, later enriched with scraped content
//! - [`ExtractionResult`]: what the content extractor recovered for one URL
//! - [`ScoredCandidate`]: a candidate paired with its popularity score
//! - [`GeneratedPost`]: the social post produced for a selected article
//!
//! Nothing here outlives a run; the driver owns every value.

use crate::utils::{char_len, take_chars};
use itertools::Itertools;

/// One article announced by the feed.
///
/// The feed fields are fixed once read. `content` and `tags` stay empty until
/// the selector merges a successful [`ExtractionResult`] into the article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateArticle {
    pub title: String,
    /// Article URL; unique within a feed.
    pub link: String,
    pub summary: String,
    /// Publication date exactly as the feed printed it.
    pub published: String,
    pub author: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl CandidateArticle {
    pub fn new(title: &str, link: &str, summary: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            summary: summary.to_string(),
            ..Self::default()
        }
    }

    /// Copy an extraction's content and tags onto the article.
    pub fn absorb(&mut self, extraction: ExtractionResult) {
        self.content = extraction.content;
        self.tags = extraction.tags;
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Main body text and tags recovered from one article page.
///
/// `content` is either empty, meaning the extraction failed, or between the
/// minimum and maximum content length it was built with. Use
/// [`ExtractionResult::gated`] to build one; it is the only constructor that
/// yields non-empty content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub content: String,
    pub tags: Vec<String>,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Apply the final length gate.
    ///
    /// Content shorter than `min_chars` becomes an empty (failed) result and
    /// its tags are dropped with it. Longer content is cut to `max_chars`
    /// characters. Tags are deduplicated in first-seen order and capped at
    /// `max_tags`.
    pub fn gated(content: &str, tags: Vec<String>, min_chars: usize, max_chars: usize, max_tags: usize) -> Self {
        let content = content.trim();
        if char_len(content) < min_chars {
            return Self::empty();
        }
        Self {
            content: take_chars(content, max_chars).to_string(),
            tags: tags.into_iter().unique().take(max_tags).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A candidate with its popularity score. Only lives during ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub article: CandidateArticle,
    pub score: i64,
}

/// A generated social post.
///
/// All three sections must be present for a post to exist; every tag carries
/// its `#` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gated_rejects_short_content() {
        let result = ExtractionResult::gated(&"字".repeat(299), vec!["AI".into()], 300, 8000, 10);
        assert!(result.is_empty());
        assert!(result.tags.is_empty());
    }

    #[test]
    fn test_gated_accepts_threshold_length() {
        let result = ExtractionResult::gated(&"字".repeat(300), vec![], 300, 8000, 10);
        assert_eq!(char_len(&result.content), 300);
    }

    #[test]
    fn test_gated_caps_content_and_tags() {
        let tags = (0..15).map(|i| format!("tag{}", i % 12)).collect();
        let result = ExtractionResult::gated(&"数据".repeat(5000), tags, 300, 8000, 10);
        assert_eq!(char_len(&result.content), 8000);
        assert_eq!(result.tags.len(), 10);
        assert_eq!(result.tags[0], "tag0");
        assert_eq!(result.tags[9], "tag9");
    }

    #[test]
    fn test_gated_trims_before_measuring() {
        let padded = format!("{}{}", " ".repeat(400), "a".repeat(10));
        assert!(ExtractionResult::gated(&padded, vec![], 300, 8000, 10).is_empty());
    }

    #[test]
    fn test_gated_length_invariant() {
        for len in [0usize, 1, 150, 299, 300, 301, 7999, 8000, 8001, 12000] {
            let result = ExtractionResult::gated(&"x".repeat(len), vec![], 300, 8000, 10);
            let got = char_len(&result.content);
            assert!(got == 0 || (300..=8000).contains(&got), "len {} gave {}", len, got);
        }
    }

    #[test]
    fn test_absorb_enriches_candidate() {
        let mut article = CandidateArticle::new("t", "https://example.com/a", "s");
        assert!(!article.has_content());
        article.absorb(ExtractionResult {
            content: "body".into(),
            tags: vec!["芯片".into()],
        });
        assert!(article.has_content());
        assert_eq!(article.tags, vec!["芯片".to_string()]);
        assert_eq!(article.title, "t");
    }
}
