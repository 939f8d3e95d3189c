//! One end-to-end run: feed, rank, select, generate, persist.

use crate::extractor::ContentSource;
use crate::feed::fetch_feed;
use crate::generator::PostGenerator;
use crate::outputs::report::write_report;
use crate::ranker::{rank, select};
use crate::tuning::{RankerTuning, SelectionTuning};
use chrono::NaiveDateTime;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feed_entries: usize,
    pub selected: usize,
    pub written: usize,
}

/// Everything one run needs, owned for the lifetime of the process.
#[derive(Debug)]
pub struct Pipeline<S, G> {
    pub client: Client,
    pub feed_url: String,
    pub target_count: usize,
    pub ranker: RankerTuning,
    pub selection: SelectionTuning,
    pub source: S,
    pub generator: G,
    pub output_dir: PathBuf,
}

impl<S, G> Pipeline<S, G>
where
    S: ContentSource,
    G: PostGenerator,
{
    /// Run once, stamping every report with `run_at`.
    ///
    /// A feed that cannot be read, or has no entries, ends the run early.
    /// Articles whose post fails to generate or to write are skipped.
    #[instrument(level = "info", skip(self), fields(feed_url = %self.feed_url))]
    pub async fn run(&self, run_at: NaiveDateTime) -> RunSummary {
        let t0 = Instant::now();
        let mut summary = RunSummary::default();

        let articles = match fetch_feed(&self.client, &self.feed_url).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(error = %e, "Could not read feed; ending run");
                return summary;
            }
        };
        summary.feed_entries = articles.len();
        if articles.is_empty() {
            warn!("Feed has no entries; ending run");
            return summary;
        }

        let ranked = rank(articles, &self.ranker);
        let selected = select(ranked, self.target_count, &self.selection, &self.source).await;
        summary.selected = selected.len();
        info!(selected = selected.len(), target_count = self.target_count, "Selection done");

        for (i, article) in selected.iter().enumerate() {
            let index = i + 1;
            let Some(post) = self.generator.generate(article).await else {
                warn!(index, title = %article.title, "No post generated; nothing written");
                continue;
            };
            match write_report(&self.output_dir, run_at, index, article, &post).await {
                Ok(_) => summary.written += 1,
                Err(e) => error!(index, error = %e, "Failed to write report"),
            }
        }

        let elapsed = t0.elapsed();
        info!(
            ?elapsed,
            feed_entries = summary.feed_entries,
            selected = summary.selected,
            written = summary.written,
            "Run complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateArticle, ExtractionResult, GeneratedPost};
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct AlwaysContent;

    impl ContentSource for AlwaysContent {
        async fn extract(&self, url: &str) -> ExtractionResult {
            ExtractionResult::gated(&format!("{} {}", url, "正文".repeat(200)), vec![], 300, 8000, 10)
        }
    }

    /// Refuses articles whose title mentions "失败".
    struct PickyGenerator;

    impl PostGenerator for PickyGenerator {
        async fn generate(&self, article: &CandidateArticle) -> Option<GeneratedPost> {
            if article.title.contains("失败") {
                return None;
            }
            Some(GeneratedPost {
                title: format!("✨ {}", article.title),
                content: "来看看".to_string(),
                tags: vec!["#AI".to_string()],
            })
        }
    }

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>机器之心</title>
  <item><title>重磅发布：AI芯片突破</title><link>https://example.com/1</link></item>
  <item><title>大模型生成失败案例</title><link>https://example.com/2</link></item>
  <item><title>日常</title><link>https://example.com/3</link></item>
</channel></rss>"#;

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn pipeline(feed_url: String, output_dir: PathBuf, target_count: usize) -> Pipeline<AlwaysContent, PickyGenerator> {
        Pipeline {
            client: Client::new(),
            feed_url,
            target_count,
            ranker: RankerTuning::default(),
            selection: SelectionTuning {
                request_delay_ms: 0,
                ..SelectionTuning::default()
            },
            source: AlwaysContent,
            generator: PickyGenerator,
            output_dir,
        }
    }

    async fn serve_feed(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss.xml"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn written(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_failed_generation_writes_nothing_for_that_article() {
        let server = serve_feed(200, FEED).await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(format!("{}/rss.xml", server.uri()), dir.path().to_path_buf(), 2);

        let summary = pipeline.run(run_at()).await;
        assert_eq!(
            summary,
            RunSummary {
                feed_entries: 3,
                selected: 2,
                written: 1
            }
        );
        assert_eq!(written(dir.path()), vec!["20250506_090000_1_重磅发布AI芯片突.txt"]);

        let report = std::fs::read_to_string(dir.path().join("20250506_090000_1_重磅发布AI芯片突.txt")).unwrap();
        assert!(report.contains("链接: https://example.com/1"));
        assert!(report.contains("标题: ✨ 重磅发布：AI芯片突破"));
    }

    #[tokio::test]
    async fn test_empty_feed_ends_run() {
        let server = serve_feed(200, "<rss><channel><title>空</title></channel></rss>").await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(format!("{}/rss.xml", server.uri()), dir.path().to_path_buf(), 5);

        assert_eq!(pipeline.run(run_at()).await, RunSummary::default());
        assert!(written(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_feed_ends_run() {
        let server = serve_feed(503, "").await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(format!("{}/rss.xml", server.uri()), dir.path().to_path_buf(), 5);

        assert_eq!(pipeline.run(run_at()).await, RunSummary::default());
        assert!(written(dir.path()).is_empty());
    }
}
