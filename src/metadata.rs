//! Request metadata: the endpoint path and query string of a single request.

use crate::{Error, Result};
use url::Url;

/// Query string parameters for a request.
///
/// Parameters are kept in insertion order but always emitted sorted by key,
/// so the same logical request produces the same URL no matter how the
/// parameters were assembled.
///
/// # Examples
///
/// ```
/// use scieloapi::QueryParams;
///
/// let params = QueryParams::new().with("b", 2).with("a", 1);
/// assert_eq!(
///     params.sorted_pairs(),
///     vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a parameter in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Replaces every occurrence of `key` with a single `key=value` pair.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.remove(key);
        self.insert(key, value);
    }

    /// Removes every occurrence of `key`.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Returns the first value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the parameters sorted by key.
    ///
    /// The sort is stable, so repeated keys keep their relative order.
    pub fn sorted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.pairs.clone();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Describes which resource a GET request targets.
///
/// With neither endpoint nor resource id the request targets the API root,
/// which lists the available endpoints.
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    /// The endpoint name, e.g. `journals`.
    pub endpoint: Option<String>,

    /// The resource id within the endpoint.
    pub resource_id: Option<String>,

    /// Query parameters for this request.
    pub query_params: QueryParams,
}

impl RequestMetadata {
    /// Targets the API root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Targets the collection of `endpoint`.
    pub fn collection(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Targets a single resource of `endpoint`.
    pub fn resource(endpoint: impl Into<String>, resource_id: impl ToString) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            resource_id: Some(resource_id.to_string()),
            ..Self::default()
        }
    }

    /// Replaces the query parameters of the request.
    pub fn with_query_params(mut self, params: QueryParams) -> Self {
        self.query_params = params;
        self
    }

    /// Builds the full request URL against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a resource id is set without an
    /// endpoint, or [`Error::InvalidUrl`] if the joined URL does not parse.
    pub fn full_url(&self, base: &str) -> Result<Url> {
        if self.endpoint.is_none() && self.resource_id.is_some() {
            return Err(Error::InvalidRequest(
                "resource_id depends on an endpoint definition".to_string(),
            ));
        }

        let mut url = make_full_url(&[
            Some(base),
            self.endpoint.as_deref(),
            self.resource_id.as_deref(),
        ])?;

        let pairs = self.query_params.sorted_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }
}

/// Joins URI segments into a URL.
///
/// Empty segments are skipped, each remaining segment is stripped of
/// surrounding slashes, and the result always ends with exactly one `/`.
/// `http://` is prefixed when the joined value carries no scheme.
pub(crate) fn make_full_url(segments: &[Option<&str>]) -> Result<Url> {
    let mut full = segments
        .iter()
        .flatten()
        .map(|seg| seg.trim_matches('/'))
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    full.push('/');
    if !full.contains("://") {
        full.insert_str(0, "http://");
    }

    Ok(Url::parse(&full)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_sorted_by_key() {
        let params = QueryParams::new()
            .with("username", 1)
            .with("api_key", 2)
            .with("c", 3);

        assert_eq!(
            params.sorted_pairs(),
            vec![
                ("api_key".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
                ("username".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_from_iterator_in_any_order() {
        let forward: QueryParams = [("a", 1), ("b", 2)].into_iter().collect();
        let backward: QueryParams = [("b", 2), ("a", 1)].into_iter().collect();

        assert_eq!(forward.sorted_pairs(), backward.sorted_pairs());
    }

    #[test]
    fn test_set_replaces_existing_key() {
        let mut params = QueryParams::new().with("offset", 10).with("offset", 20);
        params.set("offset", 0);

        assert_eq!(params.get("offset"), Some("0"));
        assert_eq!(params.sorted_pairs().len(), 1);
    }

    #[test]
    fn test_full_url_joins_segments() {
        let url = RequestMetadata::resource("journals", 70)
            .full_url("http://manager.scielo.org/api/v1/")
            .unwrap();

        assert_eq!(url.as_str(), "http://manager.scielo.org/api/v1/journals/70/");
    }

    #[test]
    fn test_full_url_adds_scheme_and_trailing_slash() {
        let url = RequestMetadata::collection("/journals/")
            .full_url("manager.scielo.org/api/v1")
            .unwrap();

        assert_eq!(url.as_str(), "http://manager.scielo.org/api/v1/journals/");
    }

    #[test]
    fn test_full_url_keeps_https() {
        let url = RequestMetadata::root()
            .full_url("https://manager.scielo.org/api/v1")
            .unwrap();

        assert_eq!(url.as_str(), "https://manager.scielo.org/api/v1/");
    }

    #[test]
    fn test_full_url_appends_sorted_query() {
        let url = RequestMetadata::collection("journals")
            .with_query_params(QueryParams::new().with("offset", 0).with("limit", 50))
            .full_url("http://manager.scielo.org/api/v1/")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://manager.scielo.org/api/v1/journals/?limit=50&offset=0"
        );
    }

    #[test]
    fn test_resource_id_requires_endpoint() {
        let metadata = RequestMetadata {
            resource_id: Some("1".to_string()),
            ..RequestMetadata::root()
        };

        assert!(matches!(
            metadata.full_url("http://manager.scielo.org/api/v1/"),
            Err(Error::InvalidRequest(_))
        ));
    }
}
