//! Fast-path HTTP fetch.

use crate::tuning::ExtractorTuning;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not build http client: {0}")]
    Client(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("body read failed: {0}")]
    Body(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// A page as returned by the server, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    /// Body decoded as UTF-8, invalid sequences replaced.
    pub body: String,
}

/// HTTP handle for article and feed downloads.
///
/// Sends a browser-like User-Agent and bounds every request with the fast
/// path timeout. Keeps no cookies between requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(tuning: &ExtractorTuning) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(tuning.user_agent.as_str())
            .timeout(tuning.fetch_timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// The underlying client, shared with the feed download.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url`. Non-2xx statuses are returned as pages, not errors; the
    /// caller decides what a bad status means.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let url = url::Url::parse(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(%status, bytes = bytes.len(), "Fetched page");
        Ok(FetchedPage { status, body })
    }
}
