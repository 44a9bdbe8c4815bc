//! Resolution of request targets against the application origin.

/// Error type for request targets that cannot be resolved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request target the way a page resolves a reference against
/// its document base.
///
/// Absolute URLs stand on their own; `/index.html`, `app.js` and `?page=2`
/// join onto `origin`. The result is http(s), has a lowercase host and no
/// fragment. The query string is kept as written.
pub fn resolve(origin: &url::Url, target: &str) -> Result<url::Url, UrlError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = origin.join(target).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&origin(), "/index.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_resolve_root() {
        assert_eq!(resolve(&origin(), "/").unwrap().path(), "/");
    }

    #[test]
    fn test_resolve_relative_against_directory() {
        let base = url::Url::parse("https://app.test/docs/").unwrap();
        let url = resolve(&base, "guide.html#intro").unwrap();
        assert_eq!(url.as_str(), "https://app.test/docs/guide.html");
    }

    #[test]
    fn test_resolve_query_only() {
        let base = url::Url::parse("https://app.test/list").unwrap();
        let url = resolve(&base, "?page=2&sort=b").unwrap();
        assert_eq!(url.as_str(), "https://app.test/list?page=2&sort=b");
    }

    #[test]
    fn test_resolve_absolute_url_ignores_origin() {
        let url = resolve(&origin(), " https://CDN.example.com/lib.js#v1 ").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(ref s)) if s == "file"));
        assert!(matches!(resolve(&origin(), "data:text/plain,hi"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), " "), Err(UrlError::Empty)));
    }
}
