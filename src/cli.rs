//! Command-line interface definitions for Redbook Digest.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it.

use chrono::NaiveTime;
use clap::Parser;

pub const DEFAULT_FEED_URL: &str = "https://www.jiqizhixin.com/rss.xml";

/// Parse a daily run time such as `09:00` or `21:30:15`.
pub fn parse_run_at(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM or HH:MM:SS, got `{}`", value))
}

/// Command-line arguments for Redbook Digest.
///
/// # Examples
///
/// ```sh
/// # Run now, once, writing reports to ./output
/// redbook_digest --once
///
/// # Daily at 07:30 with a different model
/// RUN_AT=07:30 AI_MODEL_NAME=qwen3-coder redbook_digest
///
/// # Override extraction heuristics
/// redbook_digest --once --tuning-file ./tuning.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// RSS or Atom feed to read articles from
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Number of posts to produce per run
    #[arg(short = 'n', long, env = "TARGET_COUNT", default_value_t = 5)]
    pub target_count: usize,

    /// Extraction attempts allowed per wanted post (at least 2)
    #[arg(long, env = "OVERFETCH_FACTOR", value_parser = clap::value_parser!(u64).range(2..))]
    pub overfetch_factor: Option<u64>,

    /// Local time of the daily run
    #[arg(long, env = "RUN_AT", default_value = "09:00", value_parser = parse_run_at)]
    pub run_at: NaiveTime,

    /// Directory the reports are written to
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    /// Model name, overriding the awful_aj config
    #[arg(long, env = "AI_MODEL_NAME")]
    pub model: Option<String>,

    /// API key, overriding the awful_aj config
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL, overriding the awful_aj config
    #[arg(long, env = "AI_API_BASE")]
    pub api_base: Option<String>,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long, env = "AJ_CONFIG")]
    pub config: Option<String>,

    /// Name of the awful_aj chat template
    #[arg(long, env = "AJ_TEMPLATE", default_value = "redbook_post")]
    pub template: String,

    /// Optional YAML file overriding extraction and ranking heuristics
    #[arg(long, env = "TUNING_FILE")]
    pub tuning_file: Option<String>,

    /// Run immediately, once, instead of daily
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["redbook_digest"]);

        assert_eq!(cli.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cli.target_count, 5);
        assert_eq!(cli.overfetch_factor, None);
        assert_eq!(cli.run_at, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(cli.output_dir, "output");
        assert_eq!(cli.template, "redbook_post");
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "redbook_digest",
            "--once",
            "-n",
            "3",
            "--overfetch-factor",
            "4",
            "--run-at",
            "21:30",
            "-o",
            "/tmp/posts",
            "--model",
            "qwen3-coder",
        ]);

        assert!(cli.once);
        assert_eq!(cli.target_count, 3);
        assert_eq!(cli.overfetch_factor, Some(4));
        assert_eq!(cli.run_at, NaiveTime::from_hms_opt(21, 30, 0).unwrap());
        assert_eq!(cli.output_dir, "/tmp/posts");
        assert_eq!(cli.model.as_deref(), Some("qwen3-coder"));
    }

    #[test]
    fn test_overfetch_below_two_rejected() {
        assert!(Cli::try_parse_from(["redbook_digest", "--overfetch-factor", "1"]).is_err());
    }

    #[test]
    fn test_parse_run_at() {
        assert_eq!(parse_run_at("07:05"), Ok(NaiveTime::from_hms_opt(7, 5, 0).unwrap()));
        assert_eq!(parse_run_at("07:05:09"), Ok(NaiveTime::from_hms_opt(7, 5, 9).unwrap()));
        assert!(parse_run_at("25:00").is_err());
        assert!(parse_run_at("nine").is_err());
    }
}
