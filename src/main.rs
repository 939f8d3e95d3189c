//! # Redbook Digest
//!
//! Reads a tech news feed, picks the articles most likely to do well on
//! social media, scrapes their full text, and has an LLM rewrite each one as
//! a RedNote (小红书) style post. Every post is saved as a plain-text report
//! next to the article it came from.
//!
//! ## Usage
//!
//! ```sh
//! redbook_digest --once -o ./output
//! ```
//!
//! Without `--once` the process stays up and runs every day at `--run-at`.
//!
//! ## Architecture
//!
//! One run is a short pipeline:
//! 1. **Feed**: Read the RSS/Atom feed into candidate articles
//! 2. **Ranking**: Score candidates on title and summary keywords
//! 3. **Selection**: Extract article bodies in rank order until enough succeed
//!    (static HTML first, headless browser when that falls short)
//! 4. **Generation**: Ask the model for one post per selected article
//! 5. **Output**: Write one report file per generated post

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod extractor;
mod feed;
mod generator;
mod models;
mod outputs;
mod pipeline;
mod post;
mod ranker;
mod schedule;
mod tuning;
mod utils;

use api::{ModelOverrides, connect};
use cli::Cli;
use extractor::Extractor;
use extractor::fetch::HttpFetcher;
use extractor::render::ChromiumRenderer;
use generator::LlmPostGenerator;
use pipeline::Pipeline;
use tuning::Tuning;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("redbook_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.feed_url, ?args.output_dir, args.target_count, args.once, "Parsed CLI arguments");

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Load tuning ----
    let mut tuning = Tuning::load(args.tuning_file.as_deref()).await?;
    if let Some(factor) = args.overfetch_factor {
        tuning.selection.overfetch_factor = usize::try_from(factor)?;
    }

    // ---- Model client ----
    let overrides = ModelOverrides {
        model: args.model.clone(),
        api_key: args.api_key.clone(),
        api_base: args.api_base.clone(),
    };
    let client = connect(args.config.as_deref(), &args.template, &overrides).await?;
    let generator = LlmPostGenerator::new(client, tuning.selection.prompt_content_chars);

    // ---- Extraction handles ----
    let fetcher = HttpFetcher::new(&tuning.extractor)?;
    let renderer = ChromiumRenderer::new(&tuning.extractor);

    let pipeline = Pipeline {
        client: fetcher.client().clone(),
        feed_url: args.feed_url.clone(),
        target_count: args.target_count,
        ranker: tuning.ranker,
        selection: tuning.selection,
        source: Extractor::new(fetcher, renderer, tuning.extractor),
        generator,
        output_dir: PathBuf::from(&args.output_dir),
    };

    if args.once {
        info!("Running once");
        let summary = pipeline.run(chrono::Local::now().naive_local()).await;
        info!(?summary, "Done");
        return Ok(());
    }

    let pipeline = &pipeline;
    schedule::run_daily(args.run_at, move |run_at| async move {
        pipeline.run(run_at).await;
    })
    .await;

    Ok(())
}
