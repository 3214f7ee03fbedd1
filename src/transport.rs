//! The transport boundary: a single GET or POST against the remote service.
//!
//! [`Transport`] is the seam between the connector and the network.
//! [`HttpTransport`] implements it with a blocking `reqwest` client and
//! translates every failure into an [`Error`] before returning.

use crate::{
    metadata::{make_full_url, RequestMetadata},
    Error, Result,
};
use http::{header, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// Client identification sent as `User-Agent` with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A username and its API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    api_key: String,
}

impl Credentials {
    /// Creates a credential pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is empty.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let api_key = api_key.into();
        if username.is_empty() || api_key.is_empty() {
            return Err(Error::ConfigurationError(
                "Both username and api key are required".to_string(),
            ));
        }
        Ok(Self { username, api_key })
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("ApiKey {}:{}", self.username, self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Issues single requests against the remote service.
///
/// Implementations must translate every failure into an [`Error`]; retrying
/// is the caller's job.
pub trait Transport: Send + Sync {
    /// Fetches the JSON document described by `metadata`, relative to `base`.
    fn get(
        &self,
        base: &str,
        metadata: &RequestMetadata,
        credentials: Option<&Credentials>,
    ) -> Result<Value>;

    /// Creates a resource at `endpoint` and returns the `Location` of the new
    /// resource, exactly as the server sent it.
    fn post(
        &self,
        base: &str,
        endpoint: &str,
        body: Vec<u8>,
        credentials: Option<&Credentials>,
    ) -> Result<String>;
}

/// A [`Transport`] backed by a blocking `reqwest` client.
///
/// # Examples
///
/// ```no_run
/// use scieloapi::HttpTransport;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let transport = HttpTransport::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a new `HttpTransportBuilder`.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    fn request(
        &self,
        method: http::Method,
        url: url::Url,
        credentials: Option<&Credentials>,
    ) -> reqwest::blocking::RequestBuilder {
        tracing::debug!(method = %method, url = %url, "Executing HTTP request");

        let mut request = self
            .http_client
            .request(method, url)
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(credentials) = credentials {
            request = request.header(header::AUTHORIZATION, credentials.authorization());
        }

        request
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        base: &str,
        metadata: &RequestMetadata,
        credentials: Option<&Credentials>,
    ) -> Result<Value> {
        let url = metadata.full_url(base)?;

        let start_time = Instant::now();
        let response = self.request(http::Method::GET, url, credentials).send()?;
        let status = response.status();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = response.text().unwrap_or_default();
            return Err(status_error(status, raw_response));
        }

        let raw_body = response.text()?;
        serde_json::from_str(&raw_body).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_response = %raw_body,
                "Failed to deserialize response"
            );
            Error::DeserializationFailed {
                raw_response: raw_body,
                serde_error: e.to_string(),
                status,
            }
        })
    }

    fn post(
        &self,
        base: &str,
        endpoint: &str,
        body: Vec<u8>,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        let url = make_full_url(&[Some(base), Some(endpoint)])?;

        let start_time = Instant::now();
        let response = self
            .request(http::Method::POST, url, credentials)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;
        let status = response.status();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "Received HTTP response"
        );

        if status != StatusCode::CREATED {
            let raw_response = response.text().unwrap_or_default();
            return Err(match Error::from_status(status, raw_response) {
                Some(err) => {
                    log_status_error(status, &err);
                    err
                }
                None => Error::Protocol(format!(
                    "Unexpected status {} when creating a resource at {}",
                    status, endpoint
                )),
            });
        }

        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Protocol("Resource created without a valid Location header".to_string())
            })
    }
}

/// Translates a non-2xx status into an error, logging it on the way.
fn status_error(status: StatusCode, raw_response: String) -> Error {
    let err = Error::from_status(status, raw_response.clone()).unwrap_or(Error::HttpError {
        status,
        raw_response,
    });
    log_status_error(status, &err);
    err
}

fn log_status_error(status: StatusCode, err: &Error) {
    if status.is_client_error() {
        tracing::error!(status = status.as_u16(), error = %err, "Client error (4xx)");
    } else if status.is_server_error() {
        tracing::warn!(status = status.as_u16(), error = %err, "Server error (5xx)");
    }
}

/// Builder for configuring and creating an [`HttpTransport`].
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `HttpTransport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client configuration is invalid.
    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(HttpTransport { http_client })
    }
}
