//! Session cookie handling.
//!
//! The sign-in proxy endpoint sets two HttpOnly cookies, a short lived `accessToken` and a long
//! lived `refreshToken`. Sign-out overwrites both with an immediately expired value. A browser
//! handles this on its own; [`SessionCookies`] does the same job for a non-browser runtime.

use chrono::{DateTime, Utc};

/// Name of the short lived access token cookie.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Name of the long lived refresh token cookie.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// The parts of a `Set-Cookie` header we care about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// The cookie is deleted by this header.
    pub expired: bool,
}

impl SetCookie {
    /// Parse a `Set-Cookie` header value, `None` if it has no `name=value` pair.
    pub fn parse(header: &str) -> Option<Self> {
        Self::parse_at(header, Utc::now())
    }

    fn parse_at(header: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut attributes = header.split(';');
        let (name, value) = attributes.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim().trim_matches('"').to_string();

        let mut expired = value.is_empty();
        for attribute in attributes {
            let (key, attr_value) = attribute.split_once('=').unwrap_or((attribute, ""));
            let attr_value = attr_value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "max-age" => {
                    if attr_value.parse::<i64>().is_ok_and(|age| age <= 0) {
                        expired = true;
                    }
                }
                "expires" => {
                    if DateTime::parse_from_rfc2822(attr_value)
                        .is_ok_and(|expires| expires.with_timezone(&Utc) <= now)
                    {
                        expired = true;
                    }
                }
                _ => (),
            }
        }

        Some(Self {
            name: name.to_string(),
            value,
            expired,
        })
    }
}

/// The session tokens of one signed in user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionCookies {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }

    /// Apply all `Set-Cookie` headers of a response. Unrelated cookies are ignored.
    pub fn update_from_headers<'a, I>(&mut self, headers: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for header in headers {
            if let Some(cookie) = SetCookie::parse(header) {
                self.apply(cookie);
            }
        }
    }

    /// Apply a single parsed `Set-Cookie` header.
    pub fn apply(&mut self, cookie: SetCookie) {
        let slot = match cookie.name.as_str() {
            ACCESS_TOKEN_COOKIE => &mut self.access_token,
            REFRESH_TOKEN_COOKIE => &mut self.refresh_token,
            _ => return,
        };

        if cookie.expired {
            tracing::debug!("session cookie '{}' cleared", cookie.name);
            *slot = None;
        } else {
            *slot = Some(cookie.value);
        }
    }

    /// Forget both tokens.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }

    /// The `Cookie` request header carrying the current tokens, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = [
            (ACCESS_TOKEN_COOKIE, &self.access_token),
            (REFRESH_TOKEN_COOKIE, &self.refresh_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|value| format!("{name}={value}")))
        .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_sign_out() {
        let mut session = SessionCookies::new();
        session.update_from_headers([
            "accessToken=a1; Path=/; HttpOnly; Max-Age=900",
            "refreshToken=r1; Path=/; HttpOnly; Max-Age=604800",
            "unrelated=x",
        ]);
        assert!(session.is_signed_in());
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("accessToken=a1; refreshToken=r1")
        );

        session.update_from_headers([
            "accessToken=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            "refreshToken=gone; Path=/; Max-Age=0",
        ]);
        assert!(!session.is_signed_in());
        assert_eq!(session.cookie_header(), None);
    }

    #[test]
    fn expiry_in_the_future_keeps_cookie() {
        let now = DateTime::parse_from_rfc2822("Mon, 01 Jan 2024 00:00:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        let cookie =
            SetCookie::parse_at("accessToken=a; Expires=Tue, 02 Jan 2024 00:00:00 GMT", now)
                .unwrap();
        assert!(!cookie.expired);

        let cookie =
            SetCookie::parse_at("accessToken=a; expires=Sun, 31 Dec 2023 00:00:00 GMT", now)
                .unwrap();
        assert!(cookie.expired);
    }

    #[test]
    fn malformed_set_cookie() {
        assert_eq!(SetCookie::parse("no pair here"), None);
        assert_eq!(SetCookie::parse("=value"), None);
    }
}
