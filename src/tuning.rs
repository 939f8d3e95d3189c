//! Heuristic knobs for extraction, ranking, and selection.
//!
//! Every threshold, selector list, and marker list the pipeline relies on
//! lives here with a default tuned for the jiqizhixin.com article pages. An
//! optional YAML file can override any subset of fields:
//!
//! ```yaml
//! extractor:
//!   noise:
//!     listing: ["今天", "昨天"]
//!   min_content_chars: 400
//! selection:
//!   overfetch_factor: 3
//! ```
//!
//! Fields that are omitted keep their defaults.

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level tuning document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    pub extractor: ExtractorTuning,
    pub ranker: RankerTuning,
    pub selection: SelectionTuning,
}

/// Denylisted substrings that mark text as something other than article body.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseMarkers {
    /// Login/paywall markers. A page containing *all* of them is treated as a
    /// login wall; a text block containing *any* of them is rejected.
    pub login_wall: Vec<String>,
    /// Markers of date-stamped "recommended articles" listings.
    pub listing: Vec<String>,
}

impl Default for NoiseMarkers {
    fn default() -> Self {
        Self {
            login_wall: strings(&["登录", "会员"]),
            listing: strings(&["今天", "08月"]),
        }
    }
}

impl NoiseMarkers {
    /// True when every login-wall marker occurs in `body`.
    pub fn is_login_wall(&self, body: &str) -> bool {
        !self.login_wall.is_empty() && self.login_wall.iter().all(|m| body.contains(m.as_str()))
    }

    pub fn has_login_marker(&self, text: &str) -> bool {
        self.login_wall.iter().any(|m| text.contains(m.as_str()))
    }

    pub fn has_listing_marker(&self, text: &str) -> bool {
        self.listing.iter().any(|m| text.contains(m.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorTuning {
    pub user_agent: String,
    pub fetch_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    /// Extra wait after the rendered page has loaded, for client-side rendering.
    pub settle_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Content selectors, tried in order.
    pub content_selectors: Vec<String>,
    /// A single selector match must be longer than this to count.
    pub noise_floor_chars: usize,
    /// A joined selector block longer than this ends the cascade early.
    pub confident_chars: usize,
    /// Anything shorter is a failed extraction.
    pub min_content_chars: usize,
    /// Extracted content is cut to this many characters.
    pub max_content_chars: usize,

    /// Container scanned when the selector cascade comes up short.
    pub block_selector: String,
    pub block_min_chars: usize,
    /// Listing markers are only looked for in this many leading characters
    /// of a scanned block.
    pub block_noise_window: usize,
    /// A scanned block must mention at least one of these.
    pub block_keywords: Vec<String>,

    pub noise: NoiseMarkers,

    pub tag_selectors: Vec<String>,
    pub tag_marker: char,
    pub tag_min_chars: usize,
    /// Exclusive upper bound on tag length.
    pub tag_max_chars: usize,
    pub max_tags: usize,
    /// Number of trailing page lines searched for `#tag` lines.
    pub tag_tail_lines: usize,
}

impl Default for ExtractorTuning {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36"
                .to_string(),
            fetch_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
            settle_ms: 5_000,
            viewport_width: 1280,
            viewport_height: 800,
            content_selectors: strings(&[
                "article .content",
                ".article-content .content",
                ".article-content",
                ".content-wrapper",
                ".article-body",
                ".post-content",
                ".entry-content",
                r#"[class*="article"] [class*="content"]"#,
            ]),
            noise_floor_chars: 100,
            confident_chars: 500,
            min_content_chars: 300,
            max_content_chars: 8000,
            block_selector: "div".to_string(),
            block_min_chars: 1000,
            block_noise_window: 500,
            block_keywords: strings(&["AI", "人工智能", "模型", "芯片", "数据"]),
            noise: NoiseMarkers::default(),
            tag_selectors: strings(&[
                r#"a[rel="tag"]"#,
                r#"a[class*="tag"]"#,
                r#"a[class*="category"]"#,
                ".tag",
                ".tags",
                r#"[class*="tag"]"#,
                r#"[class*="category"]"#,
                r#"a[href*="tag"]"#,
            ]),
            tag_marker: '#',
            tag_min_chars: 2,
            tag_max_chars: 30,
            max_tags: 10,
            tag_tail_lines: 20,
        }
    }
}

impl ExtractorTuning {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Weights and word lists for the popularity score.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankerTuning {
    pub hot_keywords: Vec<String>,
    pub title_keyword_points: i64,
    pub summary_keyword_points: i64,
    pub readable_title_min: usize,
    pub readable_title_max: usize,
    pub readable_title_points: i64,
    pub freshness_words: Vec<String>,
    pub freshness_points: i64,
    pub long_summary_chars: usize,
    pub long_summary_points: i64,
    pub medium_summary_chars: usize,
    pub medium_summary_points: i64,
}

impl Default for RankerTuning {
    fn default() -> Self {
        Self {
            hot_keywords: strings(&[
                "AI", "人工智能", "大模型", "深度学习", "机器学习", "NLP", "CV", "GPT", "BERT",
                "算法", "神经网络", "芯片", "数据集", "发布", "突破",
            ]),
            title_keyword_points: 15,
            summary_keyword_points: 8,
            readable_title_min: 10,
            readable_title_max: 50,
            readable_title_points: 5,
            freshness_words: strings(&["最新", "发布", "重磅", "突破", "升级", "开源"]),
            freshness_points: 10,
            long_summary_chars: 200,
            long_summary_points: 10,
            medium_summary_chars: 100,
            medium_summary_points: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionTuning {
    /// Extraction attempts are capped at `target_count * overfetch_factor`.
    pub overfetch_factor: usize,
    /// Pause between consecutive extraction attempts.
    pub request_delay_ms: u64,
    /// Characters of extracted content handed to the post generator.
    pub prompt_content_chars: usize,
}

impl Default for SelectionTuning {
    fn default() -> Self {
        Self {
            overfetch_factor: 2,
            request_delay_ms: 1_000,
            prompt_content_chars: 2_000,
        }
    }
}

impl SelectionTuning {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Tuning {
    /// Parse a YAML override document on top of the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut tuning: Tuning = serde_yaml::from_str(yaml)?;
        // At least two attempts per wanted article.
        tuning.selection.overfetch_factor = tuning.selection.overfetch_factor.max(2);
        // The content cap never undercuts the minimum.
        tuning.extractor.max_content_chars = tuning
            .extractor
            .max_content_chars
            .max(tuning.extractor.min_content_chars);
        Ok(tuning)
    }

    /// Load the tuning file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let yaml = tokio::fs::read_to_string(path).await?;
        let tuning = Tuning::from_yaml(&yaml)?;
        info!(path, "Loaded tuning overrides");
        Ok(tuning)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionResult;

    #[test]
    fn test_login_wall_needs_every_marker() {
        let noise = NoiseMarkers::default();
        assert!(noise.is_login_wall("请先登录，开通会员后阅读"));
        assert!(!noise.is_login_wall("请先登录"));
        assert!(!noise.is_login_wall("会员专享"));
    }

    #[test]
    fn test_empty_login_wall_list_never_matches() {
        let noise = NoiseMarkers {
            login_wall: vec![],
            listing: vec![],
        };
        assert!(!noise.is_login_wall("登录 会员"));
        assert!(!noise.has_login_marker("登录"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
extractor:
  min_content_chars: 400
  noise:
    listing: ["昨天"]
selection:
  request_delay_ms: 0
"#;
        let tuning = Tuning::from_yaml(yaml).unwrap();
        assert_eq!(tuning.extractor.min_content_chars, 400);
        assert_eq!(tuning.extractor.max_content_chars, 8000);
        assert_eq!(tuning.extractor.noise.listing, vec!["昨天".to_string()]);
        assert_eq!(tuning.extractor.noise.login_wall, NoiseMarkers::default().login_wall);
        assert_eq!(tuning.selection.request_delay_ms, 0);
        assert_eq!(tuning.selection.overfetch_factor, 2);
        assert_eq!(tuning.ranker, RankerTuning::default());
    }

    #[test]
    fn test_overfetch_factor_is_at_least_two() {
        let tuning = Tuning::from_yaml("selection:\n  overfetch_factor: 1\n").unwrap();
        assert_eq!(tuning.selection.overfetch_factor, 2);
    }

    #[test]
    fn test_content_cap_is_at_least_minimum() {
        let yaml = "extractor:\n  min_content_chars: 500\n  max_content_chars: 100\n";
        let tuning = Tuning::from_yaml(yaml).unwrap();
        assert_eq!(tuning.extractor.max_content_chars, 500);

        let ex = &tuning.extractor;
        let result = ExtractionResult::gated(
            &"字".repeat(600),
            vec![],
            ex.min_content_chars,
            ex.max_content_chars,
            ex.max_tags,
        );
        assert_eq!(result.content.chars().count(), 500);
    }

    #[test]
    fn test_example_file_restates_defaults() {
        let tuning = Tuning::from_yaml(include_str!("../tuning.example.yaml")).unwrap();
        assert_eq!(tuning, Tuning::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuning.yaml");
        std::fs::write(&path, "extractor:\n  settle_ms: 0\n").unwrap();

        let tuning = Tuning::load(path.to_str()).await.unwrap();
        assert_eq!(tuning.extractor.settle_ms, 0);
        assert!(Tuning::load(Some("/nonexistent/tuning.yaml")).await.is_err());
    }

    #[tokio::test]
    async fn test_load_without_path_is_default() {
        let tuning = Tuning::load(None).await.unwrap();
        assert_eq!(tuning, Tuning::default());
    }
}
