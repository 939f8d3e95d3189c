//! Text views over a fetched page.
//!
//! The extraction heuristics only ever ask two questions of a page: "what is
//! the visible text of each element matching this selector?" and "what is the
//! visible text of the whole page?". [`PageText`] captures exactly that, so
//! the same strategies run over a statically parsed document ([`HtmlPage`])
//! and over a snapshot taken from a headless browser ([`RenderedPage`]).

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::warn;

/// Subtrees whose text never counts as article body.
const HIDDEN_TAGS: [&str; 6] = ["script", "style", "nav", "header", "footer", "aside"];

/// Read-only text access shared by static and rendered pages.
///
/// Selectors that fail to parse or match nothing yield no texts rather than
/// an error.
pub trait PageText {
    /// Visible text of every element matching `selector`, in document order.
    fn texts(&self, selector: &str) -> Vec<String>;

    /// Visible text of the whole page, one line per text run.
    fn full_text(&self) -> String;
}

/// A statically parsed HTML document.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

/// Text nodes under `root`, skipping those inside [`HIDDEN_TAGS`] subtrees.
fn visible_runs<'a>(root: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    root.descendants().filter_map(move |node| {
        let text = node.value().as_text()?;
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
        (!hidden).then_some(&**text)
    })
}

/// Concatenated visible text of an element.
pub fn visible_text(element: ElementRef<'_>) -> String {
    visible_runs(element).collect()
}

impl PageText for HtmlPage {
    fn texts(&self, selector: &str) -> Vec<String> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(selector, error = ?e, "Skipping unparseable selector");
                return Vec::new();
            }
        };
        self.document.select(&parsed).map(visible_text).collect()
    }

    fn full_text(&self) -> String {
        let root = Selector::parse("body")
            .ok()
            .and_then(|body| self.document.select(&body).next())
            .unwrap_or_else(|| self.document.root_element());
        visible_runs(root)
            .map(str::trim)
            .filter(|run| !run.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Inner text captured from a page rendered by a headless browser.
///
/// Only the selectors requested at render time are available; any other
/// selector yields no matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPage {
    matches: HashMap<String, Vec<String>>,
    full_text: String,
}

impl RenderedPage {
    pub fn new(matches: HashMap<String, Vec<String>>, full_text: String) -> Self {
        Self { matches, full_text }
    }
}

impl PageText for RenderedPage {
    fn texts(&self, selector: &str) -> Vec<String> {
        self.matches.get(selector).cloned().unwrap_or_default()
    }

    fn full_text(&self) -> String {
        self.full_text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>t</title><style>.x{}</style></head>
<body>
  <header>站点导航</header>
  <div class="article-content">
    <p>第一段正文。</p>
    <script>var tracking = 1;</script>
    <aside>相关阅读</aside>
    <p>第二段<b>加粗</b>正文。</p>
  </div>
  <div class="article-content"><p>另一块</p></div>
  <footer>版权所有</footer>
</body></html>"#;

    #[test]
    fn test_texts_strip_hidden_subtrees() {
        let page = HtmlPage::parse(PAGE);
        let texts = page.texts(".article-content");
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("第一段正文。"));
        assert!(texts[0].contains("第二段加粗正文。"));
        assert!(!texts[0].contains("tracking"));
        assert!(!texts[0].contains("相关阅读"));
        assert_eq!(texts[1].trim(), "另一块");
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let page = HtmlPage::parse(PAGE);
        assert!(page.texts("div[[").is_empty());
    }

    #[test]
    fn test_full_text_skips_chrome() {
        let page = HtmlPage::parse(PAGE);
        let text = page.full_text();
        assert!(text.contains("第一段正文。"));
        assert!(!text.contains("站点导航"));
        assert!(!text.contains("版权所有"));
        assert!(!text.contains(".x{}"));
        assert!(text.lines().all(|line| !line.trim().is_empty()));
    }

    #[test]
    fn test_rendered_page_lookup() {
        let mut matches = HashMap::new();
        matches.insert(".post-content".to_string(), vec!["正文".to_string()]);
        let page = RenderedPage::new(matches, "整页\n#标签".to_string());
        assert_eq!(page.texts(".post-content"), vec!["正文".to_string()]);
        assert!(page.texts(".missing").is_empty());
        assert_eq!(page.full_text(), "整页\n#标签");
    }
}
