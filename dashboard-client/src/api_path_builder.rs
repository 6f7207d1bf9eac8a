use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone in a path segment or query component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builder for API proxy paths with a query.
///
/// ```rust
/// use dashboard_client::ApiPathBuilder;
///
/// let path = ApiPathBuilder::resource("course-batches")
///     .segment("batch 7")
///     .arg("include", "mentors")
///     .maybe_arg("page", &None::<u32>)
///     .build();
///
/// assert_eq!(&path, "/api/course-batches/batch%207?include=mentors");
/// ```
#[derive(Clone, Debug)]
pub struct ApiPathBuilder {
    url: String,
    separator: char,
}

impl ApiPathBuilder {
    /// Prefix every proxy endpoint lives under.
    pub const API_PREFIX: &'static str = "/api";

    /// Creates a new builder from a base path. The base is taken verbatim.
    pub fn new<'a>(base: impl Into<Cow<'a, str>>) -> Self {
        Self {
            url: base.into().into_owned(),
            separator: '?',
        }
    }

    /// Creates a builder for `/api/<resource>`.
    pub fn resource(resource: &str) -> Self {
        Self::new(Self::API_PREFIX).segment(resource)
    }

    /// Appends a percent-encoded path segment.
    ///
    /// Must be called before any query argument was added.
    pub fn segment<T: std::fmt::Display>(mut self, segment: T) -> Self {
        debug_assert_eq!(self.separator, '?', "path segment added after query arguments");
        if !self.url.ends_with('/') {
            self.url.push('/');
        }
        self.url
            .extend(utf8_percent_encode(&segment.to_string(), COMPONENT));
        self
    }

    /// Adds an argument to the query.
    ///
    /// The name and value will be percent-encoded.
    pub fn arg<T: std::fmt::Display>(mut self, name: &str, value: T) -> Self {
        self.push_separator_and_name(name);
        self.push_encoded(&value.to_string());
        self
    }

    /// Adds an optional argument to the query.
    ///
    /// Does nothing if the value is `None`. See [`arg`](Self::arg) for more details.
    pub fn maybe_arg<T: std::fmt::Display>(mut self, name: &str, value: &Option<T>) -> Self {
        if let Some(value) = value {
            self = self.arg(name, value);
        }
        self
    }

    /// Adds one `name=value` pair per entry, the way form encoded arrays are sent.
    pub fn list_arg<I>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item: std::fmt::Display>,
    {
        for entry in values {
            self = self.arg(name, entry);
        }
        self
    }

    /// Builds the url.
    pub fn build(self) -> String {
        self.url
    }

    fn push_separator_and_name(&mut self, name: &str) {
        self.url.push(self.separator);
        self.separator = '&';
        self.push_encoded(name);
        self.url.push('=');
    }

    fn push_encoded(&mut self, value: &str) {
        self.url.extend(utf8_percent_encode(value, COMPONENT));
    }
}
