//! Retrying HTTP plumbing for the remote document client.
//!
//! A thin wrapper over `reqwest` that applies a request timeout, a crate
//! user-agent, and exponential-backoff retries for transient failures
//! (HTTP 429/5xx, timeouts, connection errors).

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Method, RequestBuilder, Response};

use crate::error::PinError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RETRIES: usize = 3; // total attempts = 4

pub(crate) struct Request {
    client: reqwest::Client,
}

impl Request {
    pub(crate) fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Creates a GET request builder with defaults applied.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    /// Creates a PATCH request builder with defaults applied.
    pub(crate) fn patch(&self, url: &str) -> RequestBuilder {
        self.req(Method::PATCH, url)
    }

    fn req(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).timeout(REQUEST_TIMEOUT).header(
            "User-Agent",
            format!("pinkit-core/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Sends a request built by `get`/`patch`, retrying transient failures.
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, PinError> {
        // Streaming bodies cannot be cloned; send those once, unretried.
        let Some(template) = request_builder.try_clone() else {
            return execute(request_builder).await.map_err(Into::into);
        };

        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(MAX_RETRIES);

        (|| async {
            let request_builder = template.try_clone().ok_or_else(|| {
                HandleError::permanent(
                    "<unknown>".to_string(),
                    None,
                    "request cannot be retried because it is not cloneable".to_string(),
                )
            })?;
            execute(request_builder).await
        })
        .retry(backoff)
        .when(|err: &HandleError| err.retryable)
        .await
        .map_err(Into::into)
    }
}

#[derive(Debug)]
struct HandleError {
    url: String,
    status: Option<u16>,
    error: String,
    retryable: bool,
}

impl HandleError {
    const fn retryable(url: String, status: Option<u16>, error: String) -> Self {
        Self {
            url,
            status,
            error,
            retryable: true,
        }
    }

    const fn permanent(url: String, status: Option<u16>, error: String) -> Self {
        Self {
            url,
            status,
            error,
            retryable: false,
        }
    }
}

impl From<HandleError> for PinError {
    fn from(value: HandleError) -> Self {
        Self::RemoteStore {
            url: value.url,
            status: value.status,
            error: value.error,
        }
    }
}

async fn execute(request_builder: RequestBuilder) -> Result<Response, HandleError> {
    let (client, request) = request_builder.build_split();
    let request = request.map_err(|err| {
        HandleError::permanent(
            err.url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            None,
            format!("request build failed: {err}"),
        )
    })?;
    let url = request.url().to_string();

    match client.execute(request).await {
        Ok(response) => {
            let status = response.status().as_u16();
            if status == 429 || (500..600).contains(&status) {
                return Err(HandleError::retryable(
                    url,
                    Some(status),
                    format!("request error with bad status code {status}"),
                ));
            }
            Ok(response)
        }
        Err(err) if err.is_timeout() || err.is_connect() => Err(HandleError::retryable(
            url,
            None,
            format!("request timeout/connect error: {err}"),
        )),
        Err(err) => Err(HandleError::permanent(
            url,
            None,
            format!("request failed: {err}"),
        )),
    }
}
