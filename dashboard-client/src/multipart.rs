//! `multipart/form-data` encoding (RFC 7578) for uploads.
//!
//! Uploads go through the proxy unmodified, so the form is encoded exactly once, here. Typed
//! records either implement [`MultipartEncode`] by hand or are flattened from their `Serialize`
//! implementation with [`MultipartForm::from_serialize`].

use serde::Serialize;
use serde_json::Value;

use dashboard_http_error::ApiError;

/// Types which know how to turn themselves into a multipart form.
pub trait MultipartEncode {
    fn to_multipart(&self) -> MultipartForm;
}

/// One part of a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A `multipart/form-data` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    /// Create an empty form with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!(
            "----dashboard-form-{}",
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Create an empty form with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Flatten a serializable record into text parts.
    ///
    /// Top level scalars become one part each, arrays become one part per element, `null` fields
    /// are skipped and nested objects are sent as JSON text.
    pub fn from_serialize<T: ?Sized + Serialize>(value: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value)
            .map_err(|err| ApiError::client(format!("failed to serialize form: {err}")))?;

        let Value::Object(fields) = value else {
            return Err(ApiError::client("only records can be encoded as a form"));
        };

        let mut form = Self::new();
        for (name, value) in fields {
            match value {
                Value::Null => (),
                Value::Array(items) => {
                    for item in items {
                        form = form.text(&name, form_text(item));
                    }
                }
                other => form = form.text(&name, form_text(other)),
            }
        }
        Ok(form)
    }

    /// Adds a text field.
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: None,
            content_type: None,
            data: value.into().into_bytes(),
        });
        self
    }

    /// Adds a file field.
    pub fn file(
        mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The `Content-Type` header value including the boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form into its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");

            let mut disposition =
                format!("Content-Disposition: form-data; name=\"{}\"", escape(&part.name));
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape(filename)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        out
    }
}

fn form_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Field names and file names are quoted strings, escape the characters which would end them.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
