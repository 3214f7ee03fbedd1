//! Resource URIs of the form `/api/<version>/<endpoint>/<id>/`.

use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RESOURCE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/api/(\w+)/(\w+)/(\d+)/").expect("Invalid resource path regex")
});

/// The address of a single resource.
///
/// # Examples
///
/// ```
/// use scieloapi::ResourceUri;
///
/// let uri: ResourceUri = "/api/v1/journals/70/".parse().unwrap();
/// assert_eq!(uri.version, "v1");
/// assert_eq!(uri.endpoint, "journals");
/// assert_eq!(uri.id, "70");
/// assert_eq!(uri.to_string(), "/api/v1/journals/70/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    /// The API version segment.
    pub version: String,
    /// The endpoint segment.
    pub endpoint: String,
    /// The numeric resource id.
    pub id: String,
}

impl ResourceUri {
    /// Parses a value that starts with a resource path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if `value` does not start with
    /// `/api/<version>/<endpoint>/<id>/`.
    pub fn parse(value: &str) -> Result<Self> {
        match RESOURCE_PATH.captures(value) {
            Some(caps) if caps.get(0).map(|m| m.start()) == Some(0) => {
                Ok(Self::from_captures(&caps))
            }
            _ => Err(Error::InvalidReference(format!(
                "Invalid resource_uri: {}",
                value
            ))),
        }
    }

    /// Finds the first resource path anywhere in `value`, such as inside an
    /// absolute URL returned in a `Location` header.
    pub fn find(value: &str) -> Option<Self> {
        RESOURCE_PATH
            .captures(value)
            .map(|caps| Self::from_captures(&caps))
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        Self {
            version: caps[1].to_string(),
            endpoint: caps[2].to_string(),
            id: caps[3].to_string(),
        }
    }
}

impl FromStr for ResourceUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/api/{}/{}/{}/", self.version, self.endpoint, self.id)
    }
}
