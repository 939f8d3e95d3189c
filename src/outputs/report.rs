//! Plain-text report for one generated post.
//!
//! # Layout
//!
//! ```text
//! 生成时间: 2025-05-06 09:00:00
//! ==================================================
//!
//! 原始文章信息:
//! 标题: ...
//! 链接: ...
//! 发布时间: ...
//! 摘要: ...
//! 正文内容: ...
//! ==================================================
//!
//! 生成的小红书文案:
//! 标题: ...
//! 内容: ...
//! 标签: #AI, #芯片
//! ```

use crate::models::{CandidateArticle, GeneratedPost};
use crate::utils::sanitize_title;
use chrono::NaiveDateTime;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const RULE_WIDTH: usize = 50;

/// `{run:%Y%m%d_%H%M%S}_{index}_{clean_title}.txt`
///
/// `index` is 1-based. The title goes through [`sanitize_title`], so two
/// articles with the same cleaned title only differ by index.
pub fn report_filename(run_at: NaiveDateTime, index: usize, title: &str) -> String {
    format!(
        "{}_{}_{}.txt",
        run_at.format("%Y%m%d_%H%M%S"),
        index,
        sanitize_title(title)
    )
}

/// Render the report text for one article and the post written from it.
///
/// # Arguments
/// * `run_at` - Start time of the run, printed as the generation time
/// * `article` - The source article, including its extracted content
/// * `post` - The post generated from `article`
///
/// # Returns
/// The full report, one field per line, each section closed by a rule.
pub fn render_report(run_at: NaiveDateTime, article: &CandidateArticle, post: &GeneratedPost) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "生成时间: {generated}
{rule}

原始文章信息:
标题: {title}
链接: {link}
发布时间: {published}
摘要: {summary}
正文内容: {content}
{rule}

生成的小红书文案:
标题: {post_title}
内容: {post_content}
标签: {tags}
",
        generated = run_at.format("%Y-%m-%d %H:%M:%S"),
        title = article.title,
        link = article.link,
        published = article.published,
        summary = article.summary,
        content = article.content,
        post_title = post.title,
        post_content = post.content,
        tags = post.tags.join(", "),
    )
}

/// Write the report for the `index`-th selected article into `output_dir`.
///
/// Returns the path of the written file. An existing file with the same name
/// is overwritten.
///
/// # Errors
/// Returns an error if the file cannot be written.
#[instrument(level = "info", skip_all, fields(index = index, output_dir = %output_dir.display()))]
pub async fn write_report(
    output_dir: &Path,
    run_at: NaiveDateTime,
    index: usize,
    article: &CandidateArticle,
    post: &GeneratedPost,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(report_filename(run_at, index, &article.title));
    fs::write(&path, render_report(run_at, article, post)).await?;
    info!(path = %path.display(), "Wrote report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn sample() -> (CandidateArticle, GeneratedPost) {
        let mut article = CandidateArticle::new("AI重磅突破：新模型发布", "https://example.com/1", "摘要文字");
        article.published = "Tue, 06 May 2025 08:00:00 +0800".to_string();
        article.content = "正文".repeat(200);
        let post = GeneratedPost {
            title: "🔥 新模型来了".to_string(),
            content: "姐妹们冲！".to_string(),
            tags: vec!["#AI".to_string(), "#大模型".to_string()],
        };
        (article, post)
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename(run_at(), 1, "AI重磅突破：新模型发布"),
            "20250506_090000_1_AI重磅突破新模型.txt"
        );
        assert_eq!(report_filename(run_at(), 3, "!!!"), "20250506_090000_3_.txt");
    }

    #[test]
    fn test_render_report_layout() {
        let (article, post) = sample();
        let report = render_report(run_at(), &article, &post);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "生成时间: 2025-05-06 09:00:00");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "原始文章信息:");
        assert_eq!(lines[4], "标题: AI重磅突破：新模型发布");
        assert_eq!(lines[5], "链接: https://example.com/1");
        assert_eq!(lines[6], "发布时间: Tue, 06 May 2025 08:00:00 +0800");
        assert_eq!(lines[7], "摘要: 摘要文字");
        assert_eq!(lines[8], format!("正文内容: {}", "正文".repeat(200)));
        assert_eq!(lines[9], "=".repeat(50));
        assert_eq!(lines[11], "生成的小红书文案:");
        assert_eq!(lines[12], "标题: 🔥 新模型来了");
        assert_eq!(lines[13], "内容: 姐妹们冲！");
        assert_eq!(lines[14], "标签: #AI, #大模型");
        assert_eq!(lines[10], "");
        assert_eq!(lines.len(), 15);
        assert!(report.ends_with("标签: #AI, #大模型\n"));
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let (article, post) = sample();
        let path = write_report(dir.path(), run_at(), 2, &article, &post).await.unwrap();

        assert_eq!(path, dir.path().join("20250506_090000_2_AI重磅突破新模型.txt"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_report(run_at(), &article, &post));
    }
}
