#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Typed client for the dashboard's API proxy.
//!
//! Every proxy endpoint answers with the same JSON envelope:
//!
//! ```json
//! { "success": true, "message": "ok", "data": { ... } }
//! ```
//!
//! [`api_call`] issues one request through an [`HttpApiClient`], checks the HTTP status and the
//! envelope and returns only the `data` payload. It is the single place where transport and HTTP
//! failures are translated into [`ApiError`]s, nothing above it ever sees a raw response.

use std::collections::BTreeMap;
use std::future::Future;

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use dashboard_http_error::{api_bail, api_err, ApiError};

mod api_path_builder;
pub use api_path_builder::ApiPathBuilder;

mod body;
pub use body::RequestBody;

pub mod config;
pub use config::ClientConfig;

pub mod cookies;
pub use cookies::SessionCookies;

pub mod multipart;
pub use multipart::{MultipartEncode, MultipartForm};

#[cfg(feature = "hyper-client")]
mod client;
#[cfg(feature = "hyper-client")]
pub use client::Client;

/// HTTP client backend trait. This should be implemented for a HTTP client capable of talking to
/// the same-origin API proxy.
///
/// Credentials are the backend's business: a browser-like runtime attaches the session cookies,
/// callers never pass them in.
pub trait HttpApiClient {
    /// An API call should return a status code and the raw body.
    type ResponseFuture<'a>: Future<Output = Result<HttpApiResponse, ApiError>> + 'a
    where
        Self: 'a;

    /// An asynchronous request with a path and query component (no hostname) and a body, of
    /// which the response body is read to completion.
    ///
    /// Failures before a response was received must be reported as transport errors
    /// ([`ApiError::transport`]), any received response must be returned as is.
    fn request<'a>(
        &'a self,
        method: Method,
        path_and_query: &'a str,
        body: RequestBody,
    ) -> Self::ResponseFuture<'a>;

    /// Calls `self.request` with `Method::GET` and no body.
    fn get<'a>(&'a self, path_and_query: &'a str) -> Self::ResponseFuture<'a> {
        self.request(Method::GET, path_and_query, RequestBody::Empty)
    }

    /// Calls `self.request` with `Method::POST`.
    fn post<'a>(&'a self, path_and_query: &'a str, body: RequestBody) -> Self::ResponseFuture<'a> {
        self.request(Method::POST, path_and_query, body)
    }

    /// Calls `self.request` with `Method::PATCH`.
    fn patch<'a>(&'a self, path_and_query: &'a str, body: RequestBody) -> Self::ResponseFuture<'a> {
        self.request(Method::PATCH, path_and_query, body)
    }

    /// Calls `self.request` with `Method::PUT`.
    fn put<'a>(&'a self, path_and_query: &'a str, body: RequestBody) -> Self::ResponseFuture<'a> {
        self.request(Method::PUT, path_and_query, body)
    }

    /// Calls `self.request` with `Method::DELETE` and no body.
    fn delete<'a>(&'a self, path_and_query: &'a str) -> Self::ResponseFuture<'a> {
        self.request(Method::DELETE, path_and_query, RequestBody::Empty)
    }
}

/// Issue one request and decode the envelope, returning only its `data`.
///
/// A `data` of `null` (or a missing `data` field) is passed on as JSON `null`, so `Option<T>` and
/// `()` callers get `None` and `()`.
pub async fn api_call<T, C>(
    client: &C,
    method: Method,
    path_and_query: &str,
    body: RequestBody,
) -> Result<T, ApiError>
where
    C: HttpApiClient,
    T: DeserializeOwned,
{
    tracing::debug!("api call: {method} {path_and_query}");
    let response = client.request(method.clone(), path_and_query, body).await;
    let result = response.and_then(|response| response.expect_json::<T>());
    if let Err(err) = &result {
        tracing::warn!(
            "api call {method} {path_and_query} failed (status {}): {}",
            err.status,
            err.message
        );
    }
    result
}

/// A response from the HTTP API as required by the [`HttpApiClient`] trait.
#[derive(Clone, Debug)]
pub struct HttpApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Raw `Set-Cookie` header values, in order.
    pub set_cookie: Vec<String>,
    pub body: Vec<u8>,
}

impl HttpApiResponse {
    /// A JSON response without cookies, mostly useful for tests and mock backends.
    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            set_cookie: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Expect a successful JSON envelope and return its `data`.
    pub fn expect_json<T>(self) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let data = self.checked_envelope()?.data.unwrap_or(Value::Null);
        let missing = data.is_null();

        serde_json::from_value(data).map_err(|err| {
            if missing {
                ApiError::new(self.status, "api returned no data")
            } else {
                ApiError::new(self.status, format!("api returned unexpected data: {err}"))
            }
        })
    }

    /// Expect a successful JSON envelope, ignoring whatever is in its `data` field.
    pub fn nodata(self) -> Result<(), ApiError> {
        let envelope = self.checked_envelope()?;
        if envelope.data.as_ref().is_some_and(|data| !data.is_null()) {
            tracing::trace!("discarding data of a response expected to carry none");
        }
        Ok(())
    }

    fn checked_envelope(&self) -> Result<RawEnvelope, ApiError> {
        if !self.is_success() {
            return Err(self.error_from_body());
        }

        self.assert_json_content_type()?;

        let envelope = serde_json::from_slice::<RawEnvelope>(&self.body).map_err(|err| {
            ApiError::new(self.status, format!("failed to parse api response: {err}"))
        })?;

        envelope.check(self.status)
    }

    fn assert_json_content_type(&self) -> Result<(), ApiError> {
        match self
            .content_type
            .as_deref()
            .and_then(|v| v.split(';').next())
            .map(str::trim)
        {
            Some("application/json") | None => Ok(()),
            Some(other) => Err(ApiError::new(
                self.status,
                format!("expected json body, got {other}"),
            )),
        }
    }

    /// Build the error for a non-2xx response, preferring the server's own message.
    fn error_from_body(&self) -> ApiError {
        match serde_json::from_slice::<RawEnvelope>(&self.body) {
            Ok(envelope) if envelope.message.is_some() => envelope.into_error(self.status),
            _ => ApiError::from_status(self.status),
        }
    }
}

/// The envelope every proxy endpoint answers with.
///
/// `success: false` implies `data` is absent and `message` is a human readable cause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Lenient view of an envelope, proxies are not always consistent about which fields they send.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,

    /// Per field validation errors.
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

impl RawEnvelope {
    fn check(self, status: u16) -> Result<Self, ApiError> {
        if self.success == Some(true) {
            return Ok(self);
        }
        Err(self.into_error(status))
    }

    fn into_error(self, status: u16) -> ApiError {
        let mut message = self
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "no message provided".to_string());
        for (param, error) in self.errors {
            use std::fmt::Write;
            let _ = write!(message, "\n{param}: {error}");
        }

        ApiError::new(status, message)
    }
}

impl<C> HttpApiClient for &C
where
    C: HttpApiClient,
{
    type ResponseFuture<'a>
        = C::ResponseFuture<'a>
    where
        Self: 'a;

    fn request<'a>(
        &'a self,
        method: Method,
        path_and_query: &'a str,
        body: RequestBody,
    ) -> Self::ResponseFuture<'a> {
        C::request(self, method, path_and_query, body)
    }
}

impl<C> HttpApiClient for std::sync::Arc<C>
where
    C: HttpApiClient,
{
    type ResponseFuture<'a>
        = C::ResponseFuture<'a>
    where
        Self: 'a;

    fn request<'a>(
        &'a self,
        method: Method,
        path_and_query: &'a str,
        body: RequestBody,
    ) -> Self::ResponseFuture<'a> {
        C::request(self, method, path_and_query, body)
    }
}

impl<C> HttpApiClient for std::rc::Rc<C>
where
    C: HttpApiClient,
{
    type ResponseFuture<'a>
        = C::ResponseFuture<'a>
    where
        Self: 'a;

    fn request<'a>(
        &'a self,
        method: Method,
        path_and_query: &'a str,
        body: RequestBody,
    ) -> Self::ResponseFuture<'a> {
        C::request(self, method, path_and_query, body)
    }
}
