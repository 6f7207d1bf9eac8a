use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use http::uri::PathAndQuery;
use http::{Method, Request, Response, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;

use dashboard_http_error::ApiError;

use crate::{ClientConfig, HttpApiClient, HttpApiResponse, RequestBody, SessionCookies};

type ResponseFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpApiResponse, ApiError>> + Send + 'a>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An API proxy client backed by a `hyper` connection pool.
///
/// Behaves like a browser talking to a same-origin endpoint: session cookies set by any response
/// are remembered and sent along with every following request. Requests are never retried.
pub struct Client {
    api_url: Uri,
    client: HyperClient<HttpConnector, Full<Bytes>>,
    session: Arc<Mutex<SessionCookies>>,
    user_agent: String,
    timeout: Option<Duration>,
}

impl Client {
    pub const DEFAULT_USER_AGENT_STRING: &'static str = "dashboard-client/0.1";

    /// Create a new client instance for the proxy at `config.api_url`.
    pub fn new(config: ClientConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
        let client = HyperClient::builder(TokioExecutor::new()).build(connector);

        Self {
            api_url: config.api_url,
            client,
            session: Arc::new(Mutex::new(SessionCookies::new())),
            user_agent: config
                .user_agent
                .unwrap_or_else(|| Self::DEFAULT_USER_AGENT_STRING.to_string()),
            timeout: config.timeout,
        }
    }

    /// Create a client from the `DASHBOARD_*` environment variables.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    /// Get the currently used API url.
    pub fn api_url(&self) -> &Uri {
        &self.api_url
    }

    /// A snapshot of the current session cookies.
    pub fn session(&self) -> SessionCookies {
        self.session_lock().clone()
    }

    /// Drop the session cookies locally.
    pub fn sign_out(&self) {
        self.session_lock().clear();
    }

    fn session_lock(&self) -> std::sync::MutexGuard<'_, SessionCookies> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a URI relative to the current API endpoint.
    fn build_uri(&self, path_and_query: &str) -> Result<Uri, ApiError> {
        let parts = self.api_url.clone().into_parts();
        let mut builder = http::uri::Builder::new();
        match parts.scheme {
            Some(scheme) if scheme == http::uri::Scheme::HTTP => builder = builder.scheme(scheme),
            Some(scheme) => {
                return Err(ApiError::client(format!(
                    "unsupported scheme '{scheme}', the API proxy is reached over plain http"
                )))
            }
            None => (),
        }
        if let Some(authority) = parts.authority {
            builder = builder.authority(authority)
        }
        builder
            .path_and_query(
                path_and_query
                    .parse::<PathAndQuery>()
                    .map_err(|err| ApiError::client(format!("failed to parse uri - {err}")))?,
            )
            .build()
            .map_err(|err| ApiError::client(format!("failed to build uri - {err}")))
    }

    fn build_request(
        &self,
        method: Method,
        path_and_query: &str,
        body: RequestBody,
    ) -> Result<Request<Full<Bytes>>, ApiError> {
        let mut request = Request::builder()
            .method(method)
            .uri(self.build_uri(path_and_query)?)
            .header(USER_AGENT, &self.user_agent);

        // multipart carries its own boundary, json gets the plain type, empty bodies get none
        if let Some(content_type) = body.content_type() {
            request = request.header(CONTENT_TYPE, content_type);
        }

        if let Some(cookie) = self.session_lock().cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        request
            .body(Full::new(Bytes::from(body.into_bytes())))
            .map_err(|err| ApiError::client(format!("failed to build request - {err}")))
    }

    async fn read_response(&self, response: Response<Incoming>) -> Result<HttpApiResponse, ApiError> {
        let (parts, body) = response.into_parts();

        let set_cookie: Vec<String> = parts
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        self.session_lock()
            .update_from_headers(set_cookie.iter().map(String::as_str));

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = body
            .collect()
            .await
            .map_err(|err| ApiError::transport(format!("error reading response body - {err}")))?
            .to_bytes()
            .to_vec();

        Ok(HttpApiResponse {
            status: parts.status.as_u16(),
            content_type,
            set_cookie,
            body,
        })
    }

    async fn execute(
        &self,
        method: Method,
        path_and_query: &str,
        body: RequestBody,
    ) -> Result<HttpApiResponse, ApiError> {
        let request = self.build_request(method, path_and_query, body)?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|err| transport_error(&err))?;
            self.read_response(response).await
        };

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| ApiError::new(ApiError::TRANSPORT_STATUS, "request timed out"))?,
            None => exchange.await,
        }
    }
}

/// A transport error naming the innermost cause, hyper's own message rarely says what went wrong.
fn transport_error(err: &(dyn std::error::Error + 'static)) -> ApiError {
    let mut cause = err;
    while let Some(source) = cause.source() {
        cause = source;
    }

    let message = err.to_string();
    let cause = cause.to_string();
    if cause == message {
        ApiError::transport(message)
    } else {
        ApiError::transport(format!("{message}: {cause}"))
    }
}

impl HttpApiClient for Client {
    type ResponseFuture<'a> = ResponseFuture<'a>;

    fn request<'a>(
        &'a self,
        method: Method,
        path_and_query: &'a str,
        body: RequestBody,
    ) -> Self::ResponseFuture<'a> {
        Box::pin(self.execute(method, path_and_query, body))
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Wrapped(&'static str, Option<Box<Wrapped>>);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|err| err as _)
        }
    }

    #[test]
    fn transport_error_names_the_cause() {
        let err = Wrapped(
            "client error (Connect)",
            Some(Box::new(Wrapped(
                "tcp connect error",
                Some(Box::new(Wrapped("Connection refused", None))),
            ))),
        );
        assert_eq!(
            transport_error(&err).message,
            "request failed: client error (Connect): Connection refused"
        );

        let err = Wrapped("connection closed", None);
        assert_eq!(transport_error(&err).message, "request failed: connection closed");
    }

    #[tokio::test]
    async fn https_is_rejected_before_sending() {
        let client = Client::new(ClientConfig::new(Uri::from_static("https://admin.example.com")));
        let err = client.get("/api/courses").await.unwrap_err();
        assert!(err.is_client_side());
        assert!(err.message.contains("unsupported scheme 'https'"));
    }
}
