use std::{fmt, time::Duration};

use bytes::Bytes;
use mime::Mime;
use reqwest::{blocking::Client, header::CONTENT_TYPE, StatusCode};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Resp {
    pub content_type: Option<Mime>,
    pub body: Bytes,
    pub status: u16,
}

/// Why a remote document is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound,
    Transient(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Transient(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Found(Resp),
    NotFound,
    Failed(String),
}

impl FetchOutcome {
    pub fn into_result(self) -> Result<Resp, FetchFailure> {
        match self {
            FetchOutcome::Found(resp) => Ok(resp),
            FetchOutcome::NotFound => Err(FetchFailure::NotFound),
            FetchOutcome::Failed(reason) => Err(FetchFailure::Transient(reason)),
        }
    }
}

pub trait Fetcher {
    fn fetch(&self, url: &str, accept: &str) -> FetchOutcome;
}

/// Blocking HTTP client, every request is bounded by the configured timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    fn fetch(&self, url: &str, accept: &str) -> FetchOutcome {
        info!("fetching <{}>", url);
        let resp = match self.client.get(url).header("Accept", accept).send() {
            Ok(x) => x,
            Err(e) if e.is_timeout() => return FetchOutcome::Failed("timed out".into()),
            Err(e) => return FetchOutcome::Failed(e.to_string()),
        };

        let status = resp.status();
        debug!(%status);
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            return FetchOutcome::Failed(format!("status {}", status));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|x| x.to_str().ok())
            .and_then(|x| x.parse::<Mime>().ok());

        match resp.bytes() {
            Ok(body) => FetchOutcome::Found(Resp {
                content_type,
                body,
                status: status.as_u16(),
            }),
            Err(e) => FetchOutcome::Failed(e.to_string()),
        }
    }
}
