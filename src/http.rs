//! Sending [`OutgoingRequest`]s over HTTP.

use crate::request::{OutgoingRequest, Response};
use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs a request and reports the status and body.
///
/// Non-2xx statuses are successful executions; only transport failures are errors.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &OutgoingRequest) -> Result<Response, ExecutorError>;
}

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    ReqwestRequest(#[from] reqwest::Error),
}

/// Executes requests against a fixed API base URL.
pub struct HttpExecutor {
    http: Client,
    base_url: Url,
}

impl HttpExecutor {
    pub fn new(base_url: Url) -> Result<Self, ExecutorError> {
        let http = Client::builder()
            .redirect(Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Resolves `request.path` below the base URL and attaches the query string.
    ///
    /// The path is appended rather than joined so a versioned base like `.../v1` is kept.
    pub fn request_url(&self, request: &OutgoingRequest) -> Result<Url, ExecutorError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: &OutgoingRequest) -> Result<Response, ExecutorError> {
        let url = self.request_url(request)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.http.request(request.method.clone(), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "received response");

        Ok(Response::new(
            status,
            (!body.is_empty()).then(|| body.to_vec()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn executor(base: &str) -> HttpExecutor {
        HttpExecutor::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn request_url_keeps_versioned_base_path() {
        let executor = executor("https://androidmanagement.googleapis.com/v1");
        let request = OutgoingRequest::new(Method::GET, "/enterprises");

        assert_eq!(
            executor.request_url(&request).unwrap().as_str(),
            "https://androidmanagement.googleapis.com/v1/enterprises"
        );
    }

    #[test]
    fn request_url_encodes_query_parameters() {
        let executor = executor("https://androidmanagement.googleapis.com/v1/");
        let mut request = OutgoingRequest::new(Method::GET, "enterprises");
        request.query.append("projectId", "p1");
        request.query.append("filter", "a b&c");

        assert_eq!(
            executor.request_url(&request).unwrap().as_str(),
            "https://androidmanagement.googleapis.com/v1/enterprises?projectId=p1&filter=a+b%26c"
        );
    }
}
