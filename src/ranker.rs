//! Popularity scoring and article selection.
//!
//! Scoring is a pure keyword heuristic over the feed's title and summary.
//! Selection walks the ranked list, extracting one article at a time, until
//! enough articles yielded usable content or the attempt budget runs out.

use crate::extractor::ContentSource;
use crate::models::{CandidateArticle, ScoredCandidate};
use crate::tuning::{RankerTuning, SelectionTuning};
use crate::utils::{char_len, truncate_for_log};
use std::cmp::Reverse;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Popularity score of one candidate. Lengths are counted in characters.
pub fn score(article: &CandidateArticle, tuning: &RankerTuning) -> i64 {
    let title = article.title.as_str();
    let summary = article.summary.as_str();
    let mut score = 0;

    for keyword in &tuning.hot_keywords {
        if title.contains(keyword.as_str()) {
            score += tuning.title_keyword_points;
        }
        if summary.contains(keyword.as_str()) {
            score += tuning.summary_keyword_points;
        }
    }

    let title_len = char_len(title);
    if (tuning.readable_title_min..=tuning.readable_title_max).contains(&title_len) {
        score += tuning.readable_title_points;
    }

    if tuning.freshness_words.iter().any(|w| title.contains(w.as_str())) {
        score += tuning.freshness_points;
    }

    let summary_len = char_len(summary);
    if summary_len > tuning.long_summary_chars {
        score += tuning.long_summary_points;
    } else if summary_len > tuning.medium_summary_chars {
        score += tuning.medium_summary_points;
    }

    score
}

/// Score every candidate and sort by score, highest first. Ties keep feed order.
#[instrument(level = "info", skip_all, fields(candidates = articles.len()))]
pub fn rank(articles: Vec<CandidateArticle>, tuning: &RankerTuning) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = articles
        .into_iter()
        .map(|article| ScoredCandidate {
            score: score(&article, tuning),
            article,
        })
        .collect();
    ranked.sort_by_key(|candidate| Reverse(candidate.score));

    for (position, candidate) in ranked.iter().take(10).enumerate() {
        debug!(
            position = position + 1,
            score = candidate.score,
            title = %truncate_for_log(&candidate.article.title, 50),
            "Ranked candidate"
        );
    }
    ranked
}

/// Pick up to `target_count` articles with extractable content.
///
/// Candidates are tried in rank order, at most `target_count *
/// overfetch_factor` of them, with a fixed pause between consecutive
/// attempts. Successful extractions are merged into the returned articles.
#[instrument(level = "info", skip(ranked, tuning, source), fields(candidates = ranked.len()))]
pub async fn select<S: ContentSource>(
    ranked: Vec<ScoredCandidate>,
    target_count: usize,
    tuning: &SelectionTuning,
    source: &S,
) -> Vec<CandidateArticle> {
    let budget = target_count.saturating_mul(tuning.overfetch_factor);
    let mut selected = Vec::with_capacity(target_count);
    let mut attempts = 0usize;

    for candidate in ranked.into_iter().take(budget) {
        if selected.len() >= target_count {
            break;
        }
        if attempts > 0 {
            sleep(tuning.request_delay()).await;
        }
        attempts += 1;

        let mut article = candidate.article;
        let extraction = source.extract(&article.link).await;
        article.absorb(extraction);
        if !article.has_content() {
            warn!(attempt = attempts, link = %article.link, "No usable content; trying next candidate");
            continue;
        }

        info!(
            attempt = attempts,
            score = candidate.score,
            chars = char_len(&article.content),
            title = %truncate_for_log(&article.title, 50),
            "Selected article"
        );
        selected.push(article);
    }

    if selected.len() < target_count {
        warn!(
            selected = selected.len(),
            target_count,
            attempts,
            "Ran out of candidates before reaching target"
        );
    }
    selected
}
