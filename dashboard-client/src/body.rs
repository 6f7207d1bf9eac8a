use serde::Serialize;

use dashboard_http_error::ApiError;

use crate::multipart::MultipartForm;

/// The body of an API request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,

    /// An already serialized JSON document.
    Json(String),

    /// A multipart form, the `Content-Type` including its boundary is derived from the form.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialize `value` into a JSON body.
    pub fn json<T: ?Sized + Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_string(value)
            .map(Self::Json)
            .map_err(|err| ApiError::client(format!("failed to serialize request body: {err}")))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    /// The `Content-Type` header to send, `None` for an empty body.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json".to_string()),
            Self::Multipart(form) => Some(form.content_type()),
        }
    }

    /// The raw bytes to put on the wire.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Empty => Vec::new(),
            Self::Json(json) => json.into_bytes(),
            Self::Multipart(form) => form.encode(),
        }
    }
}

impl From<MultipartForm> for RequestBody {
    fn from(form: MultipartForm) -> Self {
        Self::Multipart(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body() {
        let body = RequestBody::json(&serde_json::json!({ "title": "Rust" })).unwrap();
        assert_eq!(body.content_type().as_deref(), Some("application/json"));
        assert_eq!(body.into_bytes(), br#"{"title":"Rust"}"#);
    }

    #[test]
    fn unserializable_body_is_not_retried() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], "key is not a string");

        let err = RequestBody::json(&map).unwrap_err();
        assert!(err.is_client_side());
        assert!(!err.is_retryable());
        assert!(err.message.starts_with("failed to serialize request body"));
    }

    #[test]
    fn multipart_body_carries_its_boundary() {
        let form = MultipartForm::with_boundary("xyz").text("name", "Mitra");
        let body = RequestBody::from(form);
        assert!(body.is_multipart());
        assert_eq!(
            body.content_type().as_deref(),
            Some("multipart/form-data; boundary=xyz")
        );
    }

    #[test]
    fn empty_body_has_no_content_type() {
        assert_eq!(RequestBody::Empty.content_type(), None);
        assert!(RequestBody::default().into_bytes().is_empty());
    }
}
