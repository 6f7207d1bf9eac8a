//! The error every layer above the API client sees.
//!
//! An [`ApiError`] is either a *transport* error (no HTTP response was received, `status` is
//! `0`), a *client* error (the request could not even be built, `status` is `1`) or an *API*
//! error (the backend rejected the request, `status` is the HTTP status).

use std::fmt;

use serde::{ser::SerializeStruct, Serialize, Serializer};

#[doc(hidden)]
pub use http::StatusCode;

/// HTTP error including the status code and a human readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Status used for errors which happened before any HTTP response was received.
    pub const TRANSPORT_STATUS: u16 = 0;

    /// Status used for errors raised while encoding a request, before anything was sent.
    pub const CLIENT_STATUS: u16 = 1;

    pub fn new(status: u16, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create an error from a `StatusCode`.
    pub fn with_code(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(code.as_u16(), message)
    }

    /// A network/connectivity failure. The message is prefixed with `request failed`.
    pub fn transport<T: fmt::Display>(cause: T) -> Self {
        Self::new(Self::TRANSPORT_STATUS, format!("request failed: {cause}"))
    }

    /// A request which could not be encoded locally. Sending it again cannot help.
    pub fn client<T: fmt::Display>(cause: T) -> Self {
        Self::new(Self::CLIENT_STATUS, cause.to_string())
    }

    /// An error status without any usable message from the server.
    ///
    /// Uses the canonical reason phrase of the status if there is one.
    pub fn from_status(status: u16) -> Self {
        let message = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::new(status, message)
    }

    /// Whether this error was raised before any HTTP response was received.
    pub fn is_transport(&self) -> bool {
        self.status == Self::TRANSPORT_STATUS
    }

    /// Whether the request failed to encode before it was sent.
    pub fn is_client_side(&self) -> bool {
        self.status == Self::CLIENT_STATUS
    }

    /// The status as `StatusCode`, `None` for transport and client side errors.
    pub fn code(&self) -> Option<StatusCode> {
        if self.is_transport() || self.is_client_side() {
            return None;
        }
        StatusCode::from_u16(self.status).ok()
    }

    /// Server side failures (5xx) and transport errors, the only errors a read may retry.
    pub fn is_retryable(&self) -> bool {
        self.is_transport() || (500..600).contains(&self.status)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ApiError", 2)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

/// Macro to create an `ApiError` from a `StatusCode` constant name.
#[macro_export]
macro_rules! api_err {
    ($status:ident, $($fmt:tt)+) => {{
        $crate::ApiError::with_code($crate::StatusCode::$status, format!($($fmt)+))
    }};
}

/// Bail with an error generated with the `api_err!` macro.
#[macro_export]
macro_rules! api_bail {
    ($status:ident, $($fmt:tt)+) => {{
        return Err($crate::api_err!($status, $($fmt)+).into());
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_err() {
        let err = api_err!(UNPROCESSABLE_ENTITY, "title is {}", "required");
        assert_eq!(err.status, 422);
        assert_eq!(err.message, "title is required");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_api_bail() {
        fn t() -> Result<(), ApiError> {
            api_bail!(NOT_FOUND, "course {} does not exist", 7);
        }

        let err = t().unwrap_err();
        assert_eq!(err.code(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_transport() {
        let err = ApiError::transport("connection refused");
        assert!(err.is_transport());
        assert!(err.is_retryable());
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn test_client_side() {
        let err = ApiError::client("failed to serialize form");
        assert!(err.is_client_side());
        assert!(!err.is_transport());
        assert!(!err.is_retryable());
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "failed to serialize form");
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(ApiError::from_status(404).message, "Not Found");
        assert_eq!(
            ApiError::from_status(599).message,
            "request failed with status 599"
        );
        assert!(ApiError::from_status(503).is_retryable());
        assert!(!ApiError::from_status(409).is_retryable());
    }

    #[test]
    fn test_serialize() {
        let err = ApiError::new(422, "m");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "status": 422, "message": "m" }),
        );
    }
}
