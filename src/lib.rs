//! # scieloapi - A resilient client for the SciELO Manager API
//!
//! scieloapi gives object-oriented access to the paginated collections
//! ("endpoints") of a SciELO Manager instance: journals, issues, sections and
//! whatever else the API version exposes. It is built on a blocking `reqwest`
//! client and takes care of retrying connectivity failures, walking pages,
//! discovering endpoints and following relations between resources.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scieloapi::{Client, QueryParams};
//!
//! fn main() -> Result<(), scieloapi::Error> {
//!     let client = Client::builder()
//!         .credentials("some.user", "some.apikey")
//!         .build()?;
//!
//!     let journals = client.endpoint("journals").expect("journals endpoint");
//!
//!     // A single document
//!     let journal = journals.get(70)?;
//!     println!("Journal: {:?}", journal.get("title"));
//!
//!     // Every document matching a filter, fetched 50 at a time
//!     let params = QueryParams::new().with("collection", "saude-publica");
//!     for journal in journals.filter(params) {
//!         let journal = journal?;
//!         println!("{:?}", journal.get("resource_uri"));
//!     }
//!
//!     // Expand first-level relations
//!     let expanded = client.fetch_relations(&journal, &["collections"])?;
//!     println!("{:?}", expanded.get("collections"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Endpoint discovery** - Endpoints are read from the API root once per version and cached process-wide
//! - **Lazy pagination** - Collections are iterated page by page, skipping trashed documents
//! - **Retries** - Connection errors and 503 responses are retried with linear backoff
//! - **Typed errors** - HTTP statuses and transport failures map to one [`Error`] variant each
//! - **Relation lookups** - Resource URIs inside documents can be resolved in one call
//! - **Automatic logging** - Structured logging with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use scieloapi::{Client, Error};
//!
//! # fn example() -> Result<(), Error> {
//! # let client = Client::builder().build()?;
//! match client.get("/api/v1/journals/70/") {
//!     Ok(journal) => println!("Success: {:?}", journal),
//!     Err(Error::Unauthorized(_)) => eprintln!("Check your API key"),
//!     Err(Error::NotFound(_)) => eprintln!("No such journal"),
//!     Err(Error::InvalidReference(reason)) => eprintln!("Not a resource URI: {}", reason),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod connector;
mod endpoint;
mod error;
pub mod metadata;
mod resource;
pub mod retry;
mod transport;
mod version;

#[cfg(test)]
mod testing;

pub use cache::{EndpointCache, EndpointCatalog};
pub use client::{Client, ClientBuilder};
pub use connector::{
    Connector, ConnectorBuilder, Document, Documents, Page, PageMeta, Payload, DEFAULT_API_URI,
    ITEMS_PER_REQUEST,
};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use metadata::{QueryParams, RequestMetadata};
pub use resource::ResourceUri;
pub use retry::{RetryPredicate, RetryStrategy, Sleeper};
pub use transport::{Credentials, HttpTransport, HttpTransportBuilder, Transport, USER_AGENT};
pub use version::{ApiVersion, SupportedVersions};
