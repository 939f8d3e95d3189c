//! Content and tag heuristics.
//!
//! Every function here is pure over a [`PageText`]: no I/O, no hidden state.
//! The body extractor is an ordered list of strategies (one per content
//! selector) folded by [`best_block`], backed by a container scan for pages
//! whose markup none of the selectors anticipate.

use super::Stage;
use super::page::PageText;
use crate::tuning::ExtractorTuning;
use crate::utils::{char_len, take_chars};
use itertools::Itertools;
use tracing::debug;

/// Whether one selector match looks like article body.
///
/// It must be longer than the noise floor and free of both login-wall and
/// listing markers.
pub fn accept_fragment(text: &str, tuning: &ExtractorTuning) -> bool {
    char_len(text) > tuning.noise_floor_chars
        && !tuning.noise.has_login_marker(text)
        && !tuning.noise.has_listing_marker(text)
}

/// Strategy for a single selector: the accepted matches joined by blank lines.
pub fn selector_block(page: &impl PageText, selector: &str, tuning: &ExtractorTuning) -> Option<String> {
    let accepted: Vec<String> = page
        .texts(selector)
        .iter()
        .map(|text| text.trim())
        .filter(|text| accept_fragment(text, tuning))
        .map(str::to_string)
        .collect();
    if accepted.is_empty() {
        None
    } else {
        Some(accepted.join("\n\n"))
    }
}

/// Keep the longest candidate, stopping as soon as one is longer than
/// `confident_chars`. Candidates are pulled lazily, so strategies after a
/// confident hit never run.
pub fn best_block<I>(candidates: I, confident_chars: usize) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut best: Option<String> = None;
    for candidate in candidates.into_iter().flatten() {
        let len = char_len(&candidate);
        if best.as_deref().is_none_or(|b| len > char_len(b)) {
            best = Some(candidate);
            if len > confident_chars {
                break;
            }
        }
    }
    best
}

/// Run the content selectors in priority order.
pub fn selector_cascade(page: &impl PageText, tuning: &ExtractorTuning) -> Option<String> {
    let strategies = tuning.content_selectors.iter().map(|selector| {
        let block = selector_block(page, selector, tuning);
        if let Some(block) = &block {
            debug!(%selector, chars = char_len(block), "Selector matched body text");
        }
        block
    });
    best_block(strategies, tuning.confident_chars)
}

/// First large container that reads like an article.
///
/// The container must be longer than `block_min_chars`, carry no login-wall
/// marker, carry no listing marker within its first `block_noise_window`
/// characters, and mention at least one domain keyword.
pub fn block_scan(page: &impl PageText, tuning: &ExtractorTuning) -> Option<String> {
    page.texts(&tuning.block_selector)
        .into_iter()
        .map(|text| text.trim().to_string())
        .find(|text| {
            char_len(text) > tuning.block_min_chars
                && !tuning.noise.has_login_marker(text)
                && !tuning
                    .noise
                    .has_listing_marker(take_chars(text, tuning.block_noise_window))
                && tuning.block_keywords.iter().any(|k| text.contains(k.as_str()))
        })
}

/// Best body text the page offers at this stage.
///
/// The container scan kicks in when the cascade falls short of the stage's
/// floor: the minimum content length on the fast path, the confident length
/// on the rendered path.
pub fn extract_body(page: &impl PageText, tuning: &ExtractorTuning, stage: Stage) -> String {
    let content = selector_cascade(page, tuning).unwrap_or_default();
    let floor = match stage {
        Stage::Fast => tuning.min_content_chars,
        Stage::Rendered => tuning.confident_chars,
    };
    if char_len(&content) >= floor {
        return content;
    }
    match block_scan(page, tuning) {
        Some(block) => {
            debug!(?stage, chars = char_len(&block), "Container scan found body text");
            block
        }
        None => content,
    }
}

fn valid_tag(text: &str, tuning: &ExtractorTuning) -> bool {
    let len = char_len(text);
    len >= tuning.tag_min_chars && len < tuning.tag_max_chars && !text.contains(tuning.tag_marker)
}

/// Tag or category labels for the page, deduplicated and capped.
///
/// The first tag selector producing any valid label wins. Failing that, the
/// last few lines of the page are searched for `#tag` lines.
pub fn extract_tags(page: &impl PageText, tuning: &ExtractorTuning) -> Vec<String> {
    for selector in &tuning.tag_selectors {
        let found: Vec<String> = page
            .texts(selector)
            .iter()
            .map(|text| text.trim())
            .filter(|text| valid_tag(text, tuning))
            .map(str::to_string)
            .unique()
            .take(tuning.max_tags)
            .collect();
        if !found.is_empty() {
            debug!(%selector, count = found.len(), "Found tags");
            return found;
        }
    }

    let full = page.full_text();
    let lines: Vec<&str> = full.lines().collect();
    let tail = &lines[lines.len().saturating_sub(tuning.tag_tail_lines)..];
    tail.iter()
        .map(|line| line.trim())
        .filter(|line| line.starts_with(tuning.tag_marker) && char_len(line) < tuning.tag_max_chars)
        .map(str::to_string)
        .unique()
        .take(tuning.max_tags)
        .collect()
}
