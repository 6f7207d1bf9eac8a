//! Client configuration.
//!
//! The only outside knob is the location of the API proxy, read from the environment:
//!
//! * `DASHBOARD_API_URL` (required): absolute `http` URL of the proxy, e.g.
//!   `http://127.0.0.1:3000`. TLS is terminated in front of the proxy, `https` is rejected.
//! * `DASHBOARD_API_TIMEOUT` (optional): per request timeout in seconds, `0` disables it
//! * `DASHBOARD_USER_AGENT` (optional): `User-Agent` header value

use std::time::Duration;

use anyhow::{bail, format_err, Error};
use http::Uri;

pub const API_URL_ENV: &str = "DASHBOARD_API_URL";
pub const API_TIMEOUT_ENV: &str = "DASHBOARD_API_TIMEOUT";
pub const USER_AGENT_ENV: &str = "DASHBOARD_USER_AGENT";

/// Default per request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for the API [`Client`](crate::Client).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL the relative proxy paths are resolved against.
    pub api_url: Uri,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Per request timeout, `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_url: Uri) -> Self {
        Self {
            api_url,
            user_agent: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Parse the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse the configuration using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup(API_URL_ENV) {
            Some(url) if !url.trim().is_empty() => parse_api_url(url.trim())
                .map_err(|err| format_err!("invalid {API_URL_ENV} - {err}"))?,
            _ => bail!("{API_URL_ENV} is not set"),
        };

        let mut config = Self::new(api_url);

        if let Some(timeout) = lookup(API_TIMEOUT_ENV) {
            let secs: u64 = timeout
                .trim()
                .parse()
                .map_err(|err| format_err!("invalid {API_TIMEOUT_ENV} '{timeout}' - {err}"))?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.user_agent = lookup(USER_AGENT_ENV).filter(|agent| !agent.is_empty());

        Ok(config)
    }
}

fn parse_api_url(url: &str) -> Result<Uri, Error> {
    let uri: Uri = url.parse()?;
    match uri.scheme_str() {
        Some("http") => (),
        Some("https") => bail!("https is not supported, point it at the plain http proxy"),
        Some(scheme) => bail!("unsupported scheme '{scheme}'"),
        None => bail!("missing scheme"),
    }
    if uri.authority().is_none() {
        bail!("missing host");
    }
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn minimal() {
        let config =
            ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "http://127.0.0.1:3000")])).unwrap();
        assert_eq!(config.api_url.host(), Some("127.0.0.1"));
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn all_options() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "http://admin.example.com"),
            (API_TIMEOUT_ENV, "0"),
            (USER_AGENT_ENV, "dashboard-test"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, None);
        assert_eq!(config.user_agent.as_deref(), Some("dashboard-test"));
    }

    #[test]
    fn errors_name_the_variable() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(API_URL_ENV));

        let err = ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "/api")])).unwrap_err();
        assert!(err.to_string().contains("missing scheme"));

        let err = ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "https://admin.example.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("https is not supported"));

        let err = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "http://localhost"),
            (API_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(API_TIMEOUT_ENV));
    }
}
