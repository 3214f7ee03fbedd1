//! Object-oriented access to every endpoint of an API version.
//!
//! The [`Client`] type is the main entry point. It discovers the available
//! endpoints when it is built and resolves resource URIs against them.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    cache::{EndpointCache, EndpointCatalog},
    connector::{Connector, ConnectorBuilder, Document},
    endpoint::Endpoint,
    resource::ResourceUri,
    retry::{RetryPredicate, RetryStrategy, Sleeper},
    transport::Transport,
    version::{ApiVersion, SupportedVersions},
    Error, Result,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Field holding a document's own URI; never expanded.
const RESOURCE_URI_FIELD: &str = "resource_uri";

/// A collection of [`Endpoint`]s for one API version.
///
/// # Examples
///
/// ```no_run
/// use scieloapi::Client;
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let client = Client::builder()
///     .credentials("some.user", "some.apikey")
///     .build()?;
///
/// println!("Endpoints: {:?}", client.endpoints().collect::<Vec<_>>());
///
/// let journal = client.get("/api/v1/journals/70/")?;
/// let expanded = client.fetch_relations(&journal, &["collections"])?;
/// println!("{:?}", expanded.get("collections"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    version: ApiVersion,
    endpoints: BTreeMap<String, Endpoint>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Builds a client on top of `connector`, discovering its endpoints.
    ///
    /// # Errors
    ///
    /// Returns the discovery error; no client is created in that case.
    pub fn from_connector(connector: Connector) -> Result<Self> {
        let catalog = connector.list_endpoints()?;
        Ok(Self::with_catalog(connector, &catalog))
    }

    fn with_catalog(connector: Connector, catalog: &EndpointCatalog) -> Self {
        let endpoints = catalog
            .names()
            .map(|name| (name.to_string(), Endpoint::new(name, connector.clone())))
            .collect();

        tracing::debug!(
            version = %connector.version(),
            endpoints = catalog.len(),
            "Client ready"
        );

        Self {
            version: connector.version().clone(),
            endpoints,
        }
    }

    /// The API version this client talks to.
    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Iterates over the names of the available endpoints.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Looks up an endpoint by name.
    ///
    /// Returns `None` for endpoints the API does not expose.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Gets the document addressed by `resource_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if the URI is not of the form
    /// `/api/<version>/<endpoint>/<id>/`, names another API version, or names
    /// an unknown endpoint. Request errors are returned as they are.
    pub fn get(&self, resource_uri: &str) -> Result<Document> {
        let uri = ResourceUri::parse(resource_uri)?;

        if uri.version != self.version.as_str() {
            return Err(Error::InvalidReference(format!(
                "Version {} of {} does not match client version {}",
                uri.version, resource_uri, self.version
            )));
        }

        let endpoint = self.endpoint(&uri.endpoint).ok_or_else(|| {
            Error::InvalidReference(format!("Unknown endpoint {}", uri.endpoint))
        })?;

        endpoint.get(&uri.id)
    }

    /// Replaces relation fields of `document` with the documents they point to.
    ///
    /// Only first-level relations are fetched; documents pulled in are not
    /// expanded themselves. A non-empty `only` restricts expansion to the
    /// listed fields. Values that are not resolvable resource URIs are kept
    /// as they are.
    ///
    /// # Errors
    ///
    /// Request errors while fetching a related document are returned.
    pub fn fetch_relations(&self, document: &Document, only: &[&str]) -> Result<Document> {
        let mut related = Document::new();

        for (name, value) in document {
            let wanted = name != RESOURCE_URI_FIELD
                && (only.is_empty() || only.contains(&name.as_str()));

            let value = if wanted {
                self.resolve_value(value)?
            } else {
                value.clone()
            };
            related.insert(name.clone(), value);
        }

        Ok(related)
    }

    fn resolve_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(uri) => self.resolve_uri(uri, value),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(uri) => self.resolve_uri(uri, item),
                    other => Ok(other.clone()),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_uri(&self, uri: &str, original: &Value) -> Result<Value> {
        match self.get(uri) {
            Ok(document) => Ok(Value::Object(document)),
            Err(Error::InvalidReference(reason)) => {
                tracing::trace!(value = uri, reason = %reason, "Keeping unresolved value");
                Ok(original.clone())
            }
            Err(e) => Err(e),
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use scieloapi::{ClientBuilder, SupportedVersions};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let client = ClientBuilder::new()
///     .credentials("some.user", "some.apikey")
///     .api_uri("http://localhost:8000/api/")
///     .supported_versions(SupportedVersions::new(["v1", "v2"])?)
///     .version("v2")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    connector: ConnectorBuilder,
    discover: bool,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            connector: ConnectorBuilder::new(),
            discover: true,
        }
    }

    /// Sets the username and API key used for every request.
    pub fn credentials(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.connector = self.connector.credentials(username, api_key);
        self
    }

    /// Sets the unversioned API root.
    pub fn api_uri(mut self, api_uri: impl Into<String>) -> Self {
        self.connector = self.connector.api_uri(api_uri);
        self
    }

    /// Binds the client to `version`. Defaults to the current version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.connector = self.connector.version(version);
        self
    }

    /// Sets the versions the client may be bound to.
    pub fn supported_versions(mut self, versions: SupportedVersions) -> Self {
        self.connector = self.connector.supported_versions(versions);
        self
    }

    /// Replaces the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.connector = self.connector.transport(transport);
        self
    }

    /// Sets the request timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.connector = self.connector.timeout(timeout);
        self
    }

    /// Sets the retry strategy for connectivity failures.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.connector = self.connector.retry_strategy(strategy);
        self
    }

    /// Sets a custom retry predicate.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.connector = self.connector.retry_predicate(predicate);
        self
    }

    /// Replaces how the client waits between retries.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.connector = self.connector.sleeper(sleeper);
        self
    }

    /// Uses `cache` for endpoint catalogs instead of the process-wide one.
    pub fn endpoint_cache(mut self, cache: Arc<EndpointCache>) -> Self {
        self.connector = self.connector.endpoint_cache(cache);
        self
    }

    /// Whether to ask the API for its endpoints. Defaults to `true`.
    ///
    /// When disabled, the client exposes [`EndpointCatalog::conventional`].
    pub fn discover(mut self, discover: bool) -> Self {
        self.discover = discover;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the connector, or the error that
    /// made endpoint discovery fail.
    pub fn build(self) -> Result<Client> {
        let connector = self.connector.build()?;
        if self.discover {
            Client::from_connector(connector)
        } else {
            Ok(Client::with_catalog(connector, &EndpointCatalog::conventional()))
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSleeper, ScriptedTransport};
    use serde_json::json;

    fn root() -> Value {
        json!({
            "journals": {"list_endpoint": "/api/v1/journals/", "schema": "/api/v1/journals/schema/"},
            "issues": {"list_endpoint": "/api/v1/issues/", "schema": "/api/v1/issues/schema/"},
        })
    }

    fn client_with(transport: &Arc<ScriptedTransport>) -> Client {
        transport.route(None, None, root());
        Client::builder()
            .credentials("any.user", "any.apikey")
            .transport(transport.clone())
            .endpoint_cache(Arc::new(EndpointCache::new()))
            .build()
            .unwrap()
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(document) => document,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_endpoints_introspected_during_initialization() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);

        assert_eq!(client.endpoints().collect::<Vec<_>>(), vec!["issues", "journals"]);
        assert_eq!(client.version().as_str(), "v1");
        assert_eq!(client.endpoint("journals").unwrap().name(), "journals");
        assert_eq!(transport.get_calls().len(), 1);
    }

    #[test]
    fn test_unknown_endpoint_lookup_is_none() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);

        assert!(client.endpoint("articles").is_none());
        assert_eq!(transport.get_calls().len(), 1);
    }

    #[test]
    fn test_failed_discovery_fails_construction() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(Err(Error::Unauthorized("bad key".to_string())));

        let result = Client::builder()
            .transport(transport.clone())
            .endpoint_cache(Arc::new(EndpointCache::new()))
            .build();

        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_discovery_retries_connectivity_failures() {
        let transport = Arc::new(ScriptedTransport::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        transport.push(Err(Error::ConnectionError("refused".to_string())));
        transport.route(None, None, root());

        let client = Client::builder()
            .transport(transport.clone())
            .sleeper(sleeper.clone())
            .endpoint_cache(Arc::new(EndpointCache::new()))
            .build()
            .unwrap();

        assert!(client.endpoint("issues").is_some());
        assert_eq!(sleeper.pauses().len(), 1);
    }

    #[test]
    fn test_unsupported_version_fails_without_requests() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = Client::builder()
            .version("v9")
            .transport(transport.clone())
            .build();

        assert!(matches!(result, Err(Error::UnsupportedVersion { .. })));
        assert!(transport.get_calls().is_empty());
    }

    #[test]
    fn test_discovery_can_be_skipped() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = Client::builder()
            .transport(transport.clone())
            .discover(false)
            .build()
            .unwrap();

        assert!(client.endpoint("journals").is_some());
        assert!(client.endpoint("issues").is_some());
        assert!(transport.get_calls().is_empty());
    }

    #[test]
    fn test_get_matches_endpoint_get() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);
        transport.route(Some("journals"), Some("20"), json!({"title": "ABCD"}));

        let via_uri = client.get("/api/v1/journals/20/").unwrap();
        let via_endpoint = client.endpoint("journals").unwrap().get("20").unwrap();

        assert_eq!(via_uri, via_endpoint);
    }

    #[test]
    fn test_get_rejects_other_version() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);

        assert!(matches!(
            client.get("/api/v2/journals/20/"),
            Err(Error::InvalidReference(_))
        ));
        assert_eq!(transport.get_calls().len(), 1);
    }

    #[test]
    fn test_get_rejects_unknown_endpoint_and_bad_shape() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);

        assert!(matches!(
            client.get("/api/v1/unknownendpoint/20/"),
            Err(Error::InvalidReference(_))
        ));
        assert!(matches!(
            client.get("journals/20"),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_fetch_relations_replaces_relation_fields() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);
        transport.route(Some("journals"), Some("70"), json!({"title": "ABCD"}));

        let related = client
            .fetch_relations(
                &doc(json!({
                    "resource_uri": "/api/v1/j/9/",
                    "journal": "/api/v1/journals/70/",
                    "title": "Issue 1",
                    "number": 1,
                })),
                &[],
            )
            .unwrap();

        assert_eq!(related["resource_uri"], "/api/v1/j/9/");
        assert_eq!(related["journal"], json!({"title": "ABCD"}));
        assert_eq!(related["title"], "Issue 1");
        assert_eq!(related["number"], 1);
    }

    #[test]
    fn test_fetch_relations_respects_only() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);
        transport.route(Some("journals"), Some("70"), json!({"title": "ABCD"}));

        let related = client
            .fetch_relations(
                &doc(json!({
                    "journal": "/api/v1/journals/70/",
                    "issue": "/api/v1/issues/3/",
                })),
                &["journal"],
            )
            .unwrap();

        assert_eq!(related["journal"], json!({"title": "ABCD"}));
        assert_eq!(related["issue"], "/api/v1/issues/3/");

        let fetched: Vec<_> = transport
            .get_calls()
            .into_iter()
            .filter_map(|call| call.endpoint)
            .collect();
        assert_eq!(fetched, vec!["journals"]);
    }

    #[test]
    fn test_fetch_relations_resolves_lists_elementwise() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);
        transport.route(Some("issues"), Some("1"), json!({"number": 1}));

        let related = client
            .fetch_relations(
                &doc(json!({
                    "issues": ["/api/v1/issues/1/", "/api/v1/unknown/2/", 3, "plain text"],
                })),
                &[],
            )
            .unwrap();

        assert_eq!(
            related["issues"],
            json!([{"number": 1}, "/api/v1/unknown/2/", 3, "plain text"])
        );
    }

    #[test]
    fn test_fetch_relations_is_one_level_deep() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);
        transport
            .route(
                Some("issues"),
                Some("1"),
                json!({"journal": "/api/v1/journals/70/"}),
            )
            .route(Some("journals"), Some("70"), json!({"title": "ABCD"}));

        let related = client
            .fetch_relations(&doc(json!({"issue": "/api/v1/issues/1/"})), &[])
            .unwrap();

        assert_eq!(related["issue"], json!({"journal": "/api/v1/journals/70/"}));
    }

    #[test]
    fn test_fetch_relations_propagates_request_errors() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(&transport);

        let result = client.fetch_relations(&doc(json!({"journal": "/api/v1/journals/404/"})), &[]);

        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
