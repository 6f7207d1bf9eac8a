use std::fmt;

/// Identifies one cache entry, an ordered list of segments.
///
/// Keys of one resource share the resource name as first segment, so a whole resource (or all
/// its list variants) can be invalidated through a prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `[resource]`, the prefix of all keys of a resource.
    pub fn resource(resource: &str) -> Self {
        Self::new([resource])
    }

    /// `[resource, "list"]`
    pub fn list(resource: &str) -> Self {
        Self::new([resource, "list"])
    }

    /// `[resource, "detail", id]`
    pub fn detail(resource: &str, id: &str) -> Self {
        Self::new([resource, "detail", id])
    }

    /// Append a segment, e.g. the query arguments of a filtered list.
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `other` starts with all segments of `self`. A key is a prefix of itself.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        let list = QueryKey::list("courses");
        let filtered = QueryKey::list("courses").child("search=rust");
        let detail = QueryKey::detail("courses", "c1");

        assert!(list.is_prefix_of(&list));
        assert!(list.is_prefix_of(&filtered));
        assert!(!list.is_prefix_of(&detail));
        assert!(!filtered.is_prefix_of(&list));
        assert!(QueryKey::resource("courses").is_prefix_of(&detail));
        assert!(!QueryKey::resource("course").is_prefix_of(&detail));

        assert_eq!(detail.to_string(), "courses/detail/c1");
    }
}
