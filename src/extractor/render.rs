//! Rendered fetch through a headless Chromium.
//!
//! Each [`Renderer::render`] call launches its own browser, loads one URL,
//! waits for client-side rendering to settle, snapshots the inner text the
//! heuristics will ask for, and shuts the browser down again. Nothing is
//! shared between calls.

use super::page::RenderedPage;
use crate::tuning::ExtractorTuning;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser config rejected: {0}")]
    Config(String),

    #[error("browser protocol error: {0}")]
    Cdp(#[from] CdpError),

    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("page returned status {0}")]
    Status(u16),

    #[error("page returned no response")]
    NoResponse,

    #[error("unreadable page snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Accept the main document's HTTP status only when it is 200.
///
/// # Arguments
/// * `status` - Status of the navigation response, `None` when the browser
///   saw no response for the main document
///
/// # Errors
/// [`RenderError::Status`] for any other code, [`RenderError::NoResponse`]
/// when there is none.
pub fn check_status(status: Option<i64>) -> Result<(), RenderError> {
    match status {
        Some(200) => Ok(()),
        Some(code) => Err(RenderError::Status(u16::try_from(code).unwrap_or(u16::MAX))),
        None => Err(RenderError::NoResponse),
    }
}

/// What to capture from the rendered DOM.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Selectors whose matches' inner text is captured in full.
    pub selectors: Vec<String>,
    /// Container selector captured only for matches longer than `block_min_chars`.
    pub block_selector: String,
    pub block_min_chars: usize,
}

impl RenderPlan {
    pub fn from_tuning(tuning: &ExtractorTuning) -> Self {
        Self {
            selectors: tuning
                .content_selectors
                .iter()
                .chain(tuning.tag_selectors.iter())
                .cloned()
                .collect(),
            block_selector: tuning.block_selector.clone(),
            block_min_chars: tuning.block_min_chars,
        }
    }

    /// Browser-side script returning the snapshot as a JSON string.
    pub fn script(&self) -> Result<String, serde_json::Error> {
        let selectors = serde_json::to_string(&self.selectors)?;
        let block_selector = serde_json::to_string(&self.block_selector)?;
        Ok(format!(
            r#"(() => {{
  const grab = (sel) => {{
    try {{ return Array.from(document.querySelectorAll(sel), (el) => el.innerText || ""); }}
    catch (e) {{ return []; }}
  }};
  const matches = {{}};
  for (const sel of {selectors}) {{ matches[sel] = grab(sel); }}
  matches[{block_selector}] = grab({block_selector}).filter((t) => t.trim().length > {min});
  const text = document.body ? document.body.innerText : "";
  return JSON.stringify({{ matches, text }});
}})()"#,
            min = self.block_min_chars,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    matches: HashMap<String, Vec<String>>,
    text: String,
}

/// Loads a page in a browser and captures text from the live DOM.
///
/// The extractor only calls this once the static fetch fell short.
pub trait Renderer {
    /// Render `url` and capture the text described by `plan`.
    ///
    /// # Errors
    /// Returns a [`RenderError`] when the browser cannot be started, the
    /// navigation times out or answers with a status other than 200, or the
    /// snapshot cannot be read back.
    async fn render(&self, url: &str, plan: &RenderPlan) -> Result<RenderedPage, RenderError>;
}

/// Launches a fresh headless Chromium per call.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    user_agent: String,
    navigation_timeout: Duration,
    settle: Duration,
    viewport: (u32, u32),
}

impl ChromiumRenderer {
    pub fn new(tuning: &ExtractorTuning) -> Self {
        Self {
            user_agent: tuning.user_agent.clone(),
            navigation_timeout: tuning.navigation_timeout(),
            settle: tuning.settle(),
            viewport: (tuning.viewport_width, tuning.viewport_height),
        }
    }

    async fn snapshot(&self, browser: &Browser, url: &str, script: String) -> Result<RenderedPage, RenderError> {
        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await?;

        timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| RenderError::Timeout(self.navigation_timeout))??;
        let response = page.wait_for_navigation_response().await?;
        let status = response
            .as_ref()
            .and_then(|request| request.response.as_ref())
            .map(|response| response.status);
        check_status(status)?;
        debug!(settle = ?self.settle, "Page loaded; waiting for client-side rendering");
        sleep(self.settle).await;

        let json: String = page.evaluate(script).await?.into_value()?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        debug!(
            selectors = snapshot.matches.len(),
            chars = snapshot.text.chars().count(),
            "Captured rendered text"
        );
        Ok(RenderedPage::new(snapshot.matches, snapshot.text))
    }
}

impl Renderer for ChromiumRenderer {
    #[instrument(level = "info", skip(self, plan))]
    async fn render(&self, url: &str, plan: &RenderPlan) -> Result<RenderedPage, RenderError> {
        let script = plan.script()?;
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.viewport.0, self.viewport.1)
            .request_timeout(self.navigation_timeout)
            .build()
            .map_err(RenderError::Config)?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.snapshot(&browser, url, script).await;

        if let Err(e) = browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        events.abort();

        result
    }
}
