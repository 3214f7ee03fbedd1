//! Error types for SciELO Manager API calls.
//!
//! Every failure surfaced by this crate is a variant of [`Error`]. Transport
//! failures from `reqwest` and non-2xx HTTP statuses are translated into the
//! closed set of kinds below before they reach the caller, so users never
//! need to depend on the HTTP library to handle errors.

use http::StatusCode;

/// The main error type for SciELO Manager API calls.
///
/// # Examples
///
/// ```no_run
/// use scieloapi::{Client, Error};
///
/// # fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .credentials("some.user", "some.apikey")
///     .build()?;
///
/// match client.get("/api/v1/journals/70/") {
///     Ok(journal) => println!("Journal: {:?}", journal.get("title")),
///     Err(Error::NotFound(body)) => eprintln!("No such journal: {}", body),
///     Err(Error::InvalidReference(reason)) => eprintln!("Bad URI: {}", reason),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (DNS failure, refused connection, etc.).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The request failed for another transport reason, such as too many
    /// redirects or a malformed request.
    #[error("Request failed: {0}")]
    Request(String),

    /// The server returned a non-2xx status that has no dedicated variant.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
    },

    /// HTTP 400.
    #[error("Bad request (400): {0}")]
    BadRequest(String),

    /// HTTP 401.
    #[error("Unauthorized (401): {0}")]
    Unauthorized(String),

    /// HTTP 403.
    #[error("Forbidden (403): {0}")]
    Forbidden(String),

    /// HTTP 404.
    #[error("Not found (404): {0}")]
    NotFound(String),

    /// HTTP 405.
    #[error("Method not allowed (405): {0}")]
    MethodNotAllowed(String),

    /// HTTP 406.
    #[error("Not acceptable (406): {0}")]
    NotAcceptable(String),

    /// HTTP 500.
    #[error("Internal server error (500): {0}")]
    InternalServerError(String),

    /// HTTP 502.
    #[error("Bad gateway (502): {0}")]
    BadGateway(String),

    /// HTTP 503.
    #[error("Service unavailable (503): {0}")]
    ServiceUnavailable(String),

    /// The requested API version is not among the supported versions.
    #[error("Unsupported API version {version:?}. Supported are: {supported}")]
    UnsupportedVersion {
        /// The rejected version
        version: String,
        /// Comma separated list of supported versions
        supported: String,
    },

    /// Invalid configuration was provided to a builder.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A thread panicked while holding the endpoint cache lock.
    #[error("Endpoint cache lock poisoned")]
    CachePoisoned,

    /// The request could not be built, e.g. a resource id without an endpoint.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered in a way this client does not understand, such as
    /// an unexpected status on creation or an unparseable `Location` header.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A resource URI could not be resolved against the client: wrong shape,
    /// different API version or unknown endpoint.
    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    /// Failed to deserialize the response body.
    ///
    /// The raw body is kept so schema mismatches can be debugged in production.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided or produced.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Maps an HTTP status to its dedicated error kind.
    ///
    /// Returns `None` for statuses outside the translation table, including
    /// every 2xx status.
    ///
    /// # Examples
    ///
    /// ```
    /// use scieloapi::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::from_status(StatusCode::NOT_FOUND, "gone".to_string());
    /// assert!(matches!(err, Some(Error::NotFound(_))));
    ///
    /// assert!(Error::from_status(StatusCode::OK, String::new()).is_none());
    /// assert!(Error::from_status(StatusCode::GONE, String::new()).is_none());
    /// ```
    pub fn from_status(status: StatusCode, raw_response: String) -> Option<Self> {
        let err = match status.as_u16() {
            400 => Error::BadRequest(raw_response),
            401 => Error::Unauthorized(raw_response),
            403 => Error::Forbidden(raw_response),
            404 => Error::NotFound(raw_response),
            405 => Error::MethodNotAllowed(raw_response),
            406 => Error::NotAcceptable(raw_response),
            500 => Error::InternalServerError(raw_response),
            502 => Error::BadGateway(raw_response),
            503 => Error::ServiceUnavailable(raw_response),
            _ => return None,
        };
        Some(err)
    }

    /// Returns `true` if this error is a connectivity failure worth retrying.
    ///
    /// Only connection errors and 503 responses are retried; every other kind
    /// is reported to the caller on its first occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use scieloapi::Error;
    ///
    /// assert!(Error::ConnectionError("refused".to_string()).is_retryable());
    /// assert!(Error::ServiceUnavailable(String::new()).is_retryable());
    /// assert!(!Error::NotFound(String::new()).is_retryable());
    /// assert!(!Error::Timeout("slow".to_string()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConnectionError(_) | Error::ServiceUnavailable(_))
    }

    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        let code = match self {
            Error::HttpError { status, .. } => return Some(*status),
            Error::DeserializationFailed { status, .. } => return Some(*status),
            Error::BadRequest(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::NotAcceptable(_) => 406,
            Error::InternalServerError(_) => 500,
            Error::BadGateway(_) => 502,
            Error::ServiceUnavailable(_) => 503,
            _ => return None,
        };
        StatusCode::from_u16(code).ok()
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. }
            | Error::DeserializationFailed { raw_response, .. }
            | Error::BadRequest(raw_response)
            | Error::Unauthorized(raw_response)
            | Error::Forbidden(raw_response)
            | Error::NotFound(raw_response)
            | Error::MethodNotAllowed(raw_response)
            | Error::NotAcceptable(raw_response)
            | Error::InternalServerError(raw_response)
            | Error::BadGateway(raw_response)
            | Error::ServiceUnavailable(raw_response) => Some(raw_response),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Error::Timeout(message)
        } else if err.is_connect() {
            Error::ConnectionError(message)
        } else if err.is_redirect() {
            Error::Request(format!("too many redirects: {}", message))
        } else {
            Error::Request(message)
        }
    }
}

/// A specialized `Result` type for SciELO Manager API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let cases = [
            (400, "BadRequest"),
            (401, "Unauthorized"),
            (403, "Forbidden"),
            (404, "NotFound"),
            (405, "MethodNotAllowed"),
            (406, "NotAcceptable"),
            (500, "InternalServerError"),
            (502, "BadGateway"),
            (503, "ServiceUnavailable"),
        ];

        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            let err = Error::from_status(status, "body".to_string()).unwrap();
            assert!(format!("{:?}", err).starts_with(kind), "{} -> {:?}", code, err);
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.raw_response(), Some("body"));
        }
    }

    #[test]
    fn test_unmapped_statuses() {
        for code in [200, 201, 204, 301, 410, 418, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(Error::from_status(status, String::new()).is_none());
        }
    }

    #[test]
    fn test_only_connectivity_is_retryable() {
        assert!(Error::ConnectionError(String::new()).is_retryable());
        assert!(Error::ServiceUnavailable(String::new()).is_retryable());

        assert!(!Error::BadGateway(String::new()).is_retryable());
        assert!(!Error::InternalServerError(String::new()).is_retryable());
        assert!(!Error::Request(String::new()).is_retryable());
        assert!(!Error::Protocol(String::new()).is_retryable());
    }
}
