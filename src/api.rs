//! LLM client with exponential backoff retry logic.
//!
//! Posts are written by an OpenAI-compatible model reached through
//! `awful_aj`. The seams are small so the generator can be tested without a
//! network:
//! - [`AskAsync`]: send one prompt, get one reply
//! - [`AjClient`]: the `awful_aj` implementation, owning its config and template
//! - [`RetryAsk`]: decorator adding retries to any [`AskAsync`]
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to every delay

use awful_aj::api::ask;
use awful_aj::{config, config_dir, config::AwfulJadeConfig, template, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Async prompt/reply interaction with a language model.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send `text` as the user message and wait for the reply.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Delay schedule for [`RetryAsk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Retries after the first failure before giving up.
    pub max_retries: usize,
    /// Delay before the first retry; doubles with each further retry.
    pub base_delay: StdDuration,
    pub max_delay: StdDuration,
    /// Upper bound of the random jitter added to each delay, in milliseconds.
    pub max_jitter_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(30),
            max_jitter_ms: 250,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (1-based), without jitter.
    ///
    /// ```text
    /// delay = min(base_delay * 2^(attempt-1), max_delay)
    /// ```
    pub fn delay_for(&self, attempt: usize) -> StdDuration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1) as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered(&self, attempt: usize) -> StdDuration {
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter_ms);
        self.delay_for(attempt) + StdDuration::from_millis(jitter_ms)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
pub struct RetryAsk<T> {
    inner: T,
    backoff: Backoff,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap `inner` with the default schedule: 5 retries, 1 s base, 30 s cap.
    ///
    /// ```ignore
    /// let client = AjClient::new(config, template);
    /// let retry_client = RetryAsk::new(client);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::with_backoff(inner, Backoff::default())
    }

    pub fn with_backoff(inner: T, backoff: Backoff) -> Self {
        Self { inner, backoff }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk").field("backoff", &self.backoff).finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    if attempt > 0 {
                        info!(retries = attempt, "ask() succeeded after retrying");
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.backoff.max_retries {
                        error!(
                            attempt,
                            max = self.backoff.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff.jittered(attempt);
                    warn!(
                        attempt,
                        max = self.backoff.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// `awful_aj::api::ask` behind [`AskAsync`].
#[derive(Debug)]
pub struct AjClient {
    /// Model endpoint, key and sampling settings.
    config: AwfulJadeConfig,
    /// System prompt and any priming messages.
    template: ChatTemplate,
}

impl AjClient {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }
}

impl AskAsync for AjClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(reply) => info!(elapsed_ms = dt.as_millis(), chars = reply.chars().count(), "API call returned"),
            Err(e) => warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed"),
        }
        res
    }
}

/// Command-line overrides for the model connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl ModelOverrides {
    fn apply(&self, config: &mut AwfulJadeConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
    }
}

/// Load the `awful_aj` config and chat template and build a retrying client.
///
/// The config comes from `config_path` when given, otherwise from
/// `config.yaml` in the `awful_aj` config directory. The template is looked
/// up by name in that directory's `templates/`.
#[instrument(level = "info", skip(overrides))]
pub async fn connect(
    config_path: Option<&str>,
    template_name: &str,
    overrides: &ModelOverrides,
) -> Result<RetryAsk<AjClient>, Box<dyn Error>> {
    let config_path = match config_path {
        Some(path) => path.to_string(),
        None => config_dir()?.join("config.yaml").to_string_lossy().into_owned(),
    };
    let mut config = config::load_config(&config_path)?;
    overrides.apply(&mut config);
    info!(config_path, model = %config.model, api_base = %config.api_base, "Loaded model configuration");

    let template = template::load_template(template_name).await?;
    info!(template_name, "Loaded chat template");

    Ok(RetryAsk::new(AjClient::new(config, template)))
}
