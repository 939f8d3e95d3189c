//! Article body and tag extraction.
//!
//! Extraction runs in two stages. The [`Stage::Fast`] path is a plain HTTP
//! GET whose HTML is parsed statically; when that fetch fails, hits a login
//! wall, or yields too little text, the article escalates to the
//! [`Stage::Rendered`] path, which loads the page in a headless browser and
//! runs the same heuristics over the rendered text.
//!
//! Callers never see an error: a page that defeats both stages produces an
//! empty [`ExtractionResult`].

pub mod fetch;
pub mod page;
pub mod render;
pub mod strategies;

use crate::models::ExtractionResult;
use crate::tuning::{ExtractorTuning, NoiseMarkers};
use crate::utils::char_len;
use fetch::{FetchError, FetchedPage, HttpFetcher};
use page::HtmlPage;
use render::{RenderPlan, Renderer};
use reqwest::StatusCode;
use strategies::{extract_body, extract_tags};
use tracing::{info, instrument, warn};

/// Which fetch produced the page being read.
///
/// The strategies differ slightly per stage: the rendered stage also tries
/// the long-`div` block scan before falling back to the whole page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Plain HTTP GET, parsed statically.
    Fast,
    /// Headless browser snapshot.
    Rendered,
}

/// Why an article left the fast path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// The request never produced a response (DNS, connect, timeout).
    Transport(String),
    /// The server answered with something other than 200.
    Status(u16),
    /// The body carries a login prompt and a membership marker.
    LoginWall,
    /// Static extraction found this many characters, under the minimum.
    TooShort(usize),
}

/// Decide from the raw fast-path response whether to go straight to the
/// renderer. A login-walled body is never handed to the selector cascade.
///
/// # Arguments
/// * `outcome` - Result of the static fetch
/// * `noise` - Markers used to recognise a login wall
///
/// # Returns
/// `Some(reason)` when the page must be rendered, `None` when the static body
/// is worth reading. A short static body is decided later, after extraction.
pub fn should_escalate(outcome: &Result<FetchedPage, FetchError>, noise: &NoiseMarkers) -> Option<Escalation> {
    match outcome {
        Err(e) => Some(Escalation::Transport(e.to_string())),
        Ok(page) if page.status != StatusCode::OK => Some(Escalation::Status(page.status.as_u16())),
        Ok(page) if noise.is_login_wall(&page.body) => Some(Escalation::LoginWall),
        Ok(_) => None,
    }
}

fn read_static(html: &str, tuning: &ExtractorTuning) -> (String, Vec<String>) {
    let page = HtmlPage::parse(html);
    (extract_body(&page, tuning, Stage::Fast), extract_tags(&page, tuning))
}

fn gate(content: &str, tags: Vec<String>, tuning: &ExtractorTuning) -> ExtractionResult {
    ExtractionResult::gated(
        content,
        tags,
        tuning.min_content_chars,
        tuning.max_content_chars,
        tuning.max_tags,
    )
}

async fn fast_path(url: &str, fetcher: &HttpFetcher, tuning: &ExtractorTuning) -> Result<ExtractionResult, Escalation> {
    let outcome = fetcher.fetch(url).await;
    if let Some(reason) = should_escalate(&outcome, &tuning.noise) {
        return Err(reason);
    }
    let page = outcome.map_err(|e| Escalation::Transport(e.to_string()))?;

    let (content, tags) = read_static(&page.body, tuning);
    let len = char_len(&content);
    if len < tuning.min_content_chars {
        return Err(Escalation::TooShort(len));
    }
    Ok(gate(&content, tags, tuning))
}

async fn rendered_path<R: Renderer>(
    url: &str,
    reason: Escalation,
    renderer: &R,
    tuning: &ExtractorTuning,
) -> ExtractionResult {
    warn!(?reason, "Fast path insufficient; rendering page");
    let plan = RenderPlan::from_tuning(tuning);
    let page = match renderer.render(url, &plan).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "Rendered fetch failed; giving up on article");
            return ExtractionResult::empty();
        }
    };

    let content = extract_body(&page, tuning, Stage::Rendered);
    let tags = extract_tags(&page, tuning);
    let result = gate(&content, tags, tuning);
    if result.is_empty() {
        warn!(
            chars = char_len(&content),
            min = tuning.min_content_chars,
            "Rendered content below minimum; giving up on article"
        );
    } else {
        info!(chars = char_len(&result.content), tags = result.tags.len(), "Extracted rendered content");
    }
    result
}

/// Extract the body text and tags of the article at `url`.
///
/// Tries the static fetch first and renders the page only when
/// [`should_escalate`] says so or the static text is under
/// `min_content_chars`. Failures at either stage are logged, never returned.
///
/// # Returns
/// Content between `min_content_chars` and `max_content_chars` characters
/// with up to `max_tags` tags, or [`ExtractionResult::empty`].
#[instrument(level = "info", skip(fetcher, renderer, tuning))]
pub async fn extract_article<R: Renderer>(
    url: &str,
    fetcher: &HttpFetcher,
    renderer: &R,
    tuning: &ExtractorTuning,
) -> ExtractionResult {
    match fast_path(url, fetcher, tuning).await {
        Ok(result) => {
            info!(chars = char_len(&result.content), tags = result.tags.len(), "Extracted on fast path");
            result
        }
        Err(reason) => rendered_path(url, reason, renderer, tuning).await,
    }
}

/// Anything that can turn an article URL into body text.
///
/// Selection depends on this rather than on [`Extractor`] so it can run
/// against canned content.
pub trait ContentSource {
    /// Body and tags for `url`; empty when nothing usable was found.
    async fn extract(&self, url: &str) -> ExtractionResult;
}

/// The two-stage extractor with its resource handles.
///
/// Owns the HTTP client and the renderer for the life of a run, so one
/// connection pool serves every article.
#[derive(Debug)]
pub struct Extractor<R> {
    fetcher: HttpFetcher,
    renderer: R,
    tuning: ExtractorTuning,
}

impl<R: Renderer> Extractor<R> {
    pub fn new(fetcher: HttpFetcher, renderer: R, tuning: ExtractorTuning) -> Self {
        Self {
            fetcher,
            renderer,
            tuning,
        }
    }
}

impl<R: Renderer> ContentSource for Extractor<R> {
    async fn extract(&self, url: &str) -> ExtractionResult {
        extract_article(url, &self.fetcher, &self.renderer, &self.tuning).await
    }
}
