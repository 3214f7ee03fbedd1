//! API versions and the set of versions a connector accepts.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

/// An API version identifier, such as `v1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Creates a version identifier.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApiVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The API versions a connector may be bound to.
///
/// Defaults to `v1` only. The current version is the greatest identifier
/// in the set.
///
/// # Examples
///
/// ```
/// use scieloapi::SupportedVersions;
///
/// let versions = SupportedVersions::new(["v1", "v2"]).unwrap();
/// assert_eq!(versions.current().as_str(), "v2");
/// assert_eq!(versions.resolve(Some("v1")).unwrap().as_str(), "v1");
/// assert!(versions.resolve(Some("vFoo")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    versions: BTreeSet<ApiVersion>,
    current: ApiVersion,
}

impl SupportedVersions {
    /// Creates a version set.
    ///
    /// # Errors
    ///
    /// Returns an error if `versions` is empty.
    pub fn new<I, V>(versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<ApiVersion>,
    {
        let versions: BTreeSet<ApiVersion> = versions.into_iter().map(Into::into).collect();
        let current = versions.iter().next_back().cloned().ok_or_else(|| {
            Error::ConfigurationError("At least one API version must be supported".to_string())
        })?;
        Ok(Self { versions, current })
    }

    /// Returns the newest supported version.
    pub fn current(&self) -> &ApiVersion {
        &self.current
    }

    /// Returns `true` if `version` is supported.
    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.as_str() == version)
    }

    /// Picks the version a connector binds to.
    ///
    /// `None` selects the current version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] if the requested version is not
    /// in the set.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ApiVersion> {
        match requested {
            None => Ok(self.current().clone()),
            Some(version) if self.contains(version) => Ok(ApiVersion::new(version)),
            Some(version) => Err(Error::UnsupportedVersion {
                version: version.to_string(),
                supported: self.to_string(),
            }),
        }
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        let v1 = ApiVersion::new("v1");
        Self {
            versions: BTreeSet::from([v1.clone()]),
            current: v1,
        }
    }
}

impl fmt::Display for SupportedVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.versions.iter().map(ApiVersion::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
