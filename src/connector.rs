//! The connector owns the API root, version and credentials, and turns
//! logical requests into retried transport calls.
//!
//! Use [`ConnectorBuilder`] to configure and create connectors.

use crate::{
    cache::{EndpointCache, EndpointCatalog},
    metadata::{make_full_url, QueryParams, RequestMetadata},
    retry::{RetryOnConnectivity, RetryPredicate, RetryStrategy, Sleeper, ThreadSleeper},
    transport::{Credentials, HttpTransport, Transport},
    version::{ApiVersion, SupportedVersions},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Duration;

/// Page size used when iterating over a collection.
pub const ITEMS_PER_REQUEST: usize = 50;

/// Root of the official SciELO Manager API.
pub const DEFAULT_API_URI: &str = "http://manager.scielo.org/api/";

/// A single resource as returned by the API, passed through untouched.
pub type Document = serde_json::Map<String, Value>;

/// One page of a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// The documents of this page.
    pub objects: Vec<Document>,

    /// Pagination details.
    #[serde(default)]
    pub meta: PageMeta,
}

/// Pagination details of a [`Page`].
///
/// Only `next` drives iteration; the other fields are passed through as the
/// server sent them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    /// URI of the next page; `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,

    /// URI of the previous page.
    #[serde(default)]
    pub previous: Option<Value>,

    /// Items requested per page.
    #[serde(default)]
    pub limit: Option<Value>,

    /// Offset of the first item of this page.
    #[serde(default)]
    pub offset: Option<Value>,

    /// Size of the whole collection.
    #[serde(default)]
    pub total_count: Option<Value>,
}

/// The body of a resource creation request.
///
/// Raw payloads are sent unchanged; JSON payloads are encoded first.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Bytes sent as-is, e.g. an already encoded JSON document.
    Raw(Vec<u8>),
    /// A JSON value, encoded before sending.
    Json(Value),
}

impl Payload {
    /// Serializes `data` into a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `data` cannot be represented
    /// as JSON.
    pub fn json<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        serde_json::to_value(data)
            .map(Payload::Json)
            .map_err(|e| Error::SerializationFailed(e.to_string()))
    }

    fn into_body(self) -> Result<Vec<u8>> {
        match self {
            Payload::Raw(bytes) => Ok(bytes),
            Payload::Json(value) => {
                serde_json::to_vec(&value).map_err(|e| Error::SerializationFailed(e.to_string()))
            }
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Document> for Payload {
    fn from(document: Document) -> Self {
        Payload::Json(Value::Object(document))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text.into_bytes())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Raw(bytes)
    }
}

/// Encapsulates the HTTP layer for one API version and credential pair.
///
/// Connectors are cheap to clone; clones share configuration.
///
/// # Examples
///
/// ```no_run
/// use scieloapi::{Connector, QueryParams};
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let connector = Connector::builder()
///     .credentials("some.user", "some.apikey")
///     .build()?;
///
/// let journal = connector.fetch_one("journals", Some("70"), QueryParams::new())?;
/// println!("{}", journal["title"]);
///
/// let params = QueryParams::new().with("collection", "saude-publica");
/// for issue in connector.iter_docs("issues", params) {
///     println!("{}", issue?["resource_uri"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

struct ConnectorInner {
    transport: Arc<dyn Transport>,
    api_uri: String,
    version: ApiVersion,
    credentials: Option<Credentials>,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    sleeper: Arc<dyn Sleeper>,
    endpoint_cache: Arc<EndpointCache>,
}

impl Connector {
    /// Creates a new `ConnectorBuilder` for configuring a connector.
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    /// The API version this connector is bound to.
    pub fn version(&self) -> &ApiVersion {
        &self.inner.version
    }

    /// The versioned API root, e.g. `http://manager.scielo.org/api/v1/`.
    pub fn api_uri(&self) -> &str {
        &self.inner.api_uri
    }

    /// The username requests are made with, if any.
    pub fn username(&self) -> Option<&str> {
        self.inner.credentials.as_ref().map(Credentials::username)
    }

    /// Fetches a collection page or a single resource.
    ///
    /// Connectivity failures are retried according to the configured
    /// strategy; once it is exhausted the last error is returned. Any other
    /// error is returned immediately.
    pub fn fetch_one(
        &self,
        endpoint: &str,
        resource_id: Option<&str>,
        params: QueryParams,
    ) -> Result<Value> {
        let metadata = RequestMetadata {
            endpoint: Some(endpoint.to_string()),
            resource_id: resource_id.map(str::to_string),
            query_params: params,
        };
        self.fetch(&metadata)
    }

    /// Iterates lazily over every non-trashed document of `endpoint`.
    ///
    /// Pages of [`ITEMS_PER_REQUEST`] documents are fetched on demand; `limit`
    /// and `offset` in `params` are managed by the iterator.
    pub fn iter_docs(&self, endpoint: &str, params: QueryParams) -> Documents {
        Documents {
            connector: self.clone(),
            endpoint: endpoint.to_string(),
            params,
            offset: 0,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    /// Returns the endpoints available under this connector's version.
    ///
    /// The catalog is fetched once per version and shared through the
    /// connector's [`EndpointCache`].
    pub fn list_endpoints(&self) -> Result<Arc<EndpointCatalog>> {
        self.inner
            .endpoint_cache
            .get_or_fetch(&self.inner.version, || {
                tracing::debug!(version = %self.inner.version, "Discovering endpoints");
                let root = self.fetch(&RequestMetadata::root())?;
                EndpointCatalog::from_root_document(&root)
            })
    }

    /// Creates a new resource at `endpoint` and returns its URI.
    pub fn create_resource(&self, endpoint: &str, data: impl Into<Payload>) -> Result<String> {
        let body = data.into().into_body()?;
        self.inner.transport.post(
            &self.inner.api_uri,
            endpoint,
            body,
            self.inner.credentials.as_ref(),
        )
    }

    fn fetch(&self, metadata: &RequestMetadata) -> Result<Value> {
        let inner = &self.inner;
        let target = metadata.endpoint.as_deref().unwrap_or("/");
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match inner
                .transport
                .get(&inner.api_uri, metadata, inner.credentials.as_ref())
            {
                Ok(document) => return Ok(document),
                Err(e) => e,
            };

            tracing::warn!(
                error = %err,
                attempt = attempt,
                endpoint = target,
                "Request failed"
            );

            if !inner.retry_predicate.should_retry(&err, attempt) {
                return Err(err);
            }

            match inner.retry_strategy.delay_for_attempt(attempt) {
                Some(delay) => {
                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        attempt = attempt,
                        "Retrying request after delay"
                    );
                    inner.sleeper.sleep(delay);
                }
                None => {
                    tracing::error!(
                        error = %err,
                        attempts = attempt,
                        endpoint = target,
                        "Unable to connect to resource"
                    );
                    return Err(err);
                }
            }
        }
    }
}

/// Lazy iterator over the documents of a collection.
///
/// Created by [`Connector::iter_docs`]. A page is requested only when the
/// previous one has been consumed, so dropping the iterator stops all
/// further requests. After an error the iterator yields that error and ends.
pub struct Documents {
    connector: Connector,
    endpoint: String,
    params: QueryParams,
    offset: usize,
    buffer: VecDeque<Document>,
    finished: bool,
}

impl Documents {
    fn fetch_page(&mut self) -> Result<()> {
        self.params.set("limit", ITEMS_PER_REQUEST);
        self.params.set("offset", self.offset);

        let raw = self
            .connector
            .fetch_one(&self.endpoint, None, self.params.clone())?;
        let page: Page = serde_json::from_value(raw).map_err(|e| {
            Error::Protocol(format!("Malformed page from {}: {}", self.endpoint, e))
        })?;

        // trashed items still occupy their slot in the page
        self.buffer
            .extend(page.objects.into_iter().filter(|doc| !is_trashed(doc)));

        if page.meta.next.is_none() {
            self.finished = true;
        } else {
            self.offset += ITEMS_PER_REQUEST;
        }
        Ok(())
    }
}

impl Iterator for Documents {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(document) = self.buffer.pop_front() {
                return Some(Ok(document));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

impl FusedIterator for Documents {}

/// A document is trashed when its `is_trashed` flag holds any non-empty,
/// non-zero, non-false value.
fn is_trashed(document: &Document) -> bool {
    match document.get("is_trashed") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

/// Builder for configuring and creating a [`Connector`].
///
/// # Examples
///
/// ```no_run
/// use scieloapi::{ConnectorBuilder, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let connector = ConnectorBuilder::new()
///     .credentials("some.user", "some.apikey")
///     .api_uri("http://localhost:8000/api/")
///     .version("v1")
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::LinearBackoff {
///         step: Duration::from_secs(1),
///         max_retries: 3,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectorBuilder {
    api_uri: String,
    version: Option<String>,
    supported_versions: SupportedVersions,
    credentials: Option<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    endpoint_cache: Option<Arc<EndpointCache>>,
}

impl ConnectorBuilder {
    /// Creates a new `ConnectorBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_uri: DEFAULT_API_URI.to_string(),
            version: None,
            supported_versions: SupportedVersions::default(),
            credentials: None,
            transport: None,
            timeout: None,
            retry_strategy: RetryStrategy::default(),
            retry_predicate: None,
            sleeper: None,
            endpoint_cache: None,
        }
    }

    /// Sets the username and API key used for every request.
    ///
    /// Without credentials requests are anonymous.
    pub fn credentials(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), api_key.into()));
        self
    }

    /// Sets the unversioned API root. Defaults to [`DEFAULT_API_URI`].
    pub fn api_uri(mut self, api_uri: impl Into<String>) -> Self {
        self.api_uri = api_uri.into();
        self
    }

    /// Binds the connector to `version`. Defaults to the current version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the versions the connector may be bound to.
    pub fn supported_versions(mut self, versions: SupportedVersions) -> Self {
        self.supported_versions = versions;
        self
    }

    /// Replaces the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the request timeout of the default transport.
    ///
    /// Ignored when a custom transport is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry strategy for connectivity failures.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default, requests are retried based on `Error::is_retryable()`.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Replaces how the connector waits between retries.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Uses `cache` for endpoint catalogs instead of the process-wide one.
    pub fn endpoint_cache(mut self, cache: Arc<EndpointCache>) -> Self {
        self.endpoint_cache = Some(cache);
        self
    }

    /// Builds the configured `Connector`.
    ///
    /// No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for a version outside the
    /// supported set, and a configuration error for partial credentials, an
    /// invalid API root or an HTTP client that cannot be built.
    pub fn build(self) -> Result<Connector> {
        let version = self.supported_versions.resolve(self.version.as_deref())?;

        let credentials = self
            .credentials
            .map(|(username, api_key)| Credentials::new(username, api_key))
            .transpose()?;

        let api_uri =
            make_full_url(&[Some(self.api_uri.as_str()), Some(version.as_str())])?.to_string();

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = HttpTransport::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                Arc::new(builder.build()?)
            }
        };

        Ok(Connector {
            inner: Arc::new(ConnectorInner {
                transport,
                api_uri,
                version,
                credentials,
                retry_strategy: self.retry_strategy,
                retry_predicate: self
                    .retry_predicate
                    .unwrap_or_else(|| Box::new(RetryOnConnectivity)),
                sleeper: self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
                endpoint_cache: self.endpoint_cache.unwrap_or_else(EndpointCache::global),
            }),
        })
    }
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
