//! A named API endpoint bound to a connector.

use crate::{
    connector::{Connector, Document, Documents, Payload},
    metadata::QueryParams,
    resource::ResourceUri,
    Error, Result,
};
use serde_json::Value;
use std::fmt;

/// A remote collection, such as `journals`.
///
/// # Examples
///
/// ```no_run
/// use scieloapi::{Client, QueryParams};
///
/// # fn example() -> Result<(), scieloapi::Error> {
/// let client = Client::builder()
///     .credentials("some.user", "some.apikey")
///     .build()?;
///
/// if let Some(journals) = client.endpoint("journals") {
///     let journal = journals.get(70)?;
///     println!("{:?}", journal.get("title"));
///
///     let params = QueryParams::new().with("collection", "saude-publica");
///     for journal in journals.filter(params) {
///         println!("{:?}", journal?.get("title"));
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    connector: Connector,
}

impl Endpoint {
    /// Binds `name` to `connector`.
    pub fn new(name: impl Into<String>, connector: Connector) -> Self {
        Self {
            name: name.into(),
            connector,
        }
    }

    /// The endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a single document of the endpoint.
    ///
    /// # Errors
    ///
    /// Besides request errors, returns [`Error::Protocol`] if the server
    /// answers with something other than a JSON object.
    pub fn get(&self, resource_id: impl fmt::Display) -> Result<Document> {
        let resource_id = resource_id.to_string();
        match self
            .connector
            .fetch_one(&self.name, Some(&resource_id), QueryParams::new())?
        {
            Value::Object(document) => Ok(document),
            other => Err(Error::Protocol(format!(
                "Expected a document at {}/{}, got: {}",
                self.name, resource_id, other
            ))),
        }
    }

    /// Iterates over all documents of the endpoint.
    pub fn all(&self) -> Documents {
        self.connector.iter_docs(&self.name, QueryParams::new())
    }

    /// Iterates over the documents matching `params`.
    pub fn filter(&self, params: QueryParams) -> Documents {
        self.connector.iter_docs(&self.name, params)
    }

    /// Creates a new resource and returns its id.
    ///
    /// # Errors
    ///
    /// Besides request errors, returns [`Error::Protocol`] if the URI of the
    /// created resource cannot be parsed.
    pub fn post(&self, data: impl Into<Payload>) -> Result<String> {
        let location = self.connector.create_resource(&self.name, data)?;
        ResourceUri::find(&location)
            .map(|uri| uri.id)
            .ok_or_else(|| Error::Protocol(format!("Unknown url: {}", location)))
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("version", self.connector.version())
            .finish()
    }
}
