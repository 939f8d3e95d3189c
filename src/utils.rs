//! Utility functions for string manipulation and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Char-safe truncation for logging and prompt budgets
//! - Title sanitization for report file names
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static NON_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("static regex"));

/// Number of leading title characters kept in report file names.
pub const FILENAME_TITLE_CHARS: usize = 10;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and a
/// count of the dropped characters appended. Truncation always lands on a
/// char boundary, so CJK text is safe.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        format!("{}…(+{} chars)", take_chars(s, max), total - max)
    }
}

/// Return the first `max` characters of `s` as a borrowed slice.
pub fn take_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Length of `s` in characters, which is what every threshold in the
/// extractor and ranker is measured in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Turn the head of an article title into a file-name fragment.
///
/// Keeps the first [`FILENAME_TITLE_CHARS`] characters, removes everything
/// that is not a word character, whitespace or `-`, collapses runs of `-` and
/// whitespace into a single `_`, and trims leading/trailing `_`. Unicode word
/// characters (including CJK) survive.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_title("Hello, World!"), "Hello_Wor");
/// assert_eq!(sanitize_title("AI重磅突破：新模型发布"), "AI重磅突破新模型");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let head = take_chars(title, FILENAME_TITLE_CHARS);
    let stripped = NON_FILENAME_CHARS.replace_all(head, "");
    let collapsed = SEPARATOR_RUNS.replace_all(&stripped, "_");
    collapsed.trim_matches('_').to_string()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
