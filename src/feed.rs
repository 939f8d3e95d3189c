//! Syndication feed reader.
//!
//! Downloads an RSS 2.0 or Atom feed and normalizes its entries into
//! [`CandidateArticle`]s. Only the fields the ranker and the report need are
//! kept: title, link, summary, published date (as printed), and author.
//! Entries without a link are dropped since the link is what gets scraped.

use crate::models::CandidateArticle;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed feed: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    Title,
    Link,
    Summary,
    Published,
    Author,
}

impl Field {
    fn for_entry(local_name: &[u8]) -> Option<Self> {
        match local_name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" | b"summary" => Some(Self::Summary),
            b"pubDate" | b"published" | b"updated" | b"date" => Some(Self::Published),
            b"author" | b"creator" => Some(Self::Author),
            _ => None,
        }
    }
}

/// Download the feed at `url` and parse its entries.
#[instrument(level = "info", skip(client))]
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<CandidateArticle>, FeedError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }
    let xml = response.text().await?;
    let articles = parse_feed(&xml)?;
    info!(count = articles.len(), "Read feed entries");
    Ok(articles)
}

/// Parse RSS `<item>`s or Atom `<entry>`s into candidates, in feed order.
///
/// Entries without an author are credited to the channel title.
pub fn parse_feed(xml: &str) -> Result<Vec<CandidateArticle>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();
    let mut channel_title = String::new();
    let mut entry: Option<CandidateArticle> = None;
    let mut field: Option<Field> = None;
    // Elements nested inside the field being read, e.g. Atom's <author><name>.
    let mut nested = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if field.is_some() {
                    nested += 1;
                } else if name == b"item" || name == b"entry" {
                    entry = Some(CandidateArticle::default());
                } else if let Some(current) = entry.as_mut() {
                    if name == b"link" {
                        take_href(&e, current);
                    }
                    field = Field::for_entry(name);
                    text.clear();
                } else if name == b"title" && channel_title.is_empty() {
                    field = Some(Field::ChannelTitle);
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if let (Some(current), None) = (entry.as_mut(), field) {
                    if e.local_name().as_ref() == b"link" {
                        take_href(&e, current);
                    }
                }
            }
            Event::Text(t) if field.is_some() => text.push_str(&String::from_utf8_lossy(&t)),
            Event::CData(c) if field.is_some() => text.push_str(&String::from_utf8_lossy(&c)),
            Event::GeneralRef(r) if field.is_some() => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(&r)))
            }
            Event::End(e) => {
                if nested > 0 {
                    nested -= 1;
                    continue;
                }
                if let Some(done) = field.take() {
                    let value = text.trim().to_string();
                    match (done, entry.as_mut()) {
                        (Field::ChannelTitle, _) => channel_title = value,
                        (f, Some(current)) => assign(current, f, value),
                        (_, None) => {}
                    }
                    continue;
                }
                let name = e.local_name();
                if name.as_ref() == b"item" || name.as_ref() == b"entry" {
                    if let Some(mut done) = entry.take() {
                        if done.link.is_empty() {
                            warn!(title = %done.title, "Feed entry has no link; skipping");
                            continue;
                        }
                        if done.author.is_empty() {
                            done.author = channel_title.clone();
                        }
                        debug!(title = %done.title, link = %done.link, "Parsed feed entry");
                        articles.push(done);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

/// Keep the first value seen for each field.
fn assign(article: &mut CandidateArticle, field: Field, value: String) {
    let slot = match field {
        Field::Title => &mut article.title,
        Field::Link => &mut article.link,
        Field::Summary => &mut article.summary,
        Field::Published => &mut article.published,
        Field::Author => &mut article.author,
        Field::ChannelTitle => return,
    };
    if slot.is_empty() {
        *slot = value;
    }
}

/// Atom puts the entry URL in `<link rel="alternate" href="..."/>`.
fn take_href(e: &BytesStart<'_>, article: &mut CandidateArticle) {
    if !article.link.is_empty() {
        return;
    }
    let mut href = None;
    let mut alternate = true;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"href" => href = Some(String::from_utf8_lossy(&attr.value).trim().to_string()),
            b"rel" => alternate = attr.value.as_ref() == b"alternate",
            _ => {}
        }
    }
    if let (Some(href), true) = (href, alternate) {
        article.link = href;
    }
}

/// Expand a predefined XML entity or character reference (name without `&`/`;`).
fn resolve_entity(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix("#x")
            .or_else(|| name.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{};", name),
    }
}
