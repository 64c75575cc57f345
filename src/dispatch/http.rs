//! HTTP transport for dispatch and probing.
//!
//! # Responsibilities
//! - Issue JSON GET queries against an endpoint (the request function)
//! - Issue the lightweight probe query (the probe transport)
//!
//! # Design Decisions
//! - Endpoint addresses are treated as base URLs; paths are appended verbatim
//! - Non-2xx status and unparseable bodies are failures
//! - No client-level timeout: the engine and prober own the deadlines, and
//!   dropping a reqwest future cancels the underlying call

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::health::{ProbeError, ProbeTransport};
use crate::selection::Endpoint;

/// Errors from an HTTP query.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Join an endpoint base address with a path and query.
pub fn endpoint_url(endpoint: &Endpoint, path_and_query: &str) -> Result<Url, HttpError> {
    let base = endpoint.as_str().trim_end_matches('/');
    let path = path_and_query.trim_start_matches('/');
    let raw = if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    };
    Url::parse(&raw).map_err(|source| HttpError::InvalidUrl { url: raw, source })
}

/// Executes JSON GET queries against endpoints.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: reqwest::Client,
}

impl HttpRequester {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("failover-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `endpoint + path_and_query` and decode the body as JSON.
    pub async fn get_json(
        &self,
        endpoint: Endpoint,
        path_and_query: String,
    ) -> Result<Value, HttpError> {
        let url = endpoint_url(&endpoint, &path_and_query)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Probe transport that GETs a fixed path and expects parseable JSON.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    requester: HttpRequester,
    path: String,
}

impl HttpProbe {
    pub fn new(requester: HttpRequester, path: impl Into<String>) -> Self {
        Self {
            requester,
            path: path.into(),
        }
    }
}

impl ProbeTransport for HttpProbe {
    fn probe<'a>(&'a self, endpoint: &'a Endpoint) -> BoxFuture<'a, Result<(), ProbeError>> {
        Box::pin(async move {
            match self.requester.get_json(endpoint.clone(), self.path.clone()).await {
                Ok(_) => Ok(()),
                Err(HttpError::Status(code)) => Err(ProbeError::Status(code)),
                Err(HttpError::Decode(e)) => Err(ProbeError::Decode(e.to_string())),
                Err(e) => Err(ProbeError::Request(e.to_string())),
            }
        })
    }
}
