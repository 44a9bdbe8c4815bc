//! Intercepted request descriptors and the cache identity derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::hash::compute_cache_key;

/// Characters allowed in an HTTP method besides ASCII alphanumerics.
const TOKEN_PUNCTUATION: &[u8] = b"!#$%&'*+-.^_`|~";

fn is_token(method: &str) -> bool {
    !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || TOKEN_PUNCTUATION.contains(&b))
}

/// Fetch-standard request destination.
///
/// Tells the router what the requesting context intends to do with the
/// response (render a document, apply a stylesheet, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Destination {
    /// Top-level or nested browsing context (`document`).
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    Worker,
    /// The empty destination used by `fetch()` and XHR.
    #[default]
    Empty,
    /// Any other destination string, kept verbatim (lowercased).
    Other(String),
}

impl Destination {
    pub fn as_str(&self) -> &str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Worker => "worker",
            Destination::Empty => "",
            Destination::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for Destination {
    fn from(value: &str) -> Self {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "document" => Destination::Document,
            "style" => Destination::Style,
            "script" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            "worker" => Destination::Worker,
            "" => Destination::Empty,
            _ => Destination::Other(lowered),
        }
    }
}

impl From<String> for Destination {
    fn from(value: String) -> Self {
        Destination::from(value.as_str())
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Destination::from(s))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request seen by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, upper-case.
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    /// Request headers as (lowercase name, value) pairs.
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Create a GET request for the given URL and destination.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { method: "GET".into(), url, destination, headers: Vec::new() }
    }

    /// Create a request with an explicit method.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the method is empty or contains
    /// characters outside the HTTP token set.
    pub fn with_method(url: Url, destination: Destination, method: &str) -> Result<Self, Error> {
        let method = method.trim();
        if !is_token(method) {
            return Err(Error::InvalidInput(format!("invalid HTTP method: {method:?}")));
        }
        Ok(Self { method: method.to_ascii_uppercase(), url, destination, headers: Vec::new() })
    }

    /// Add a header, normalizing its name to lowercase.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// First value of the named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only GET responses are ever written to a cache generation.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// Cache identity for this request.
    ///
    /// Headers never take part: a stored response answers every request
    /// for the same method and URL, whatever headers the caller sent.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Storage identity of a request: method and fragment-less URL.
///
/// Two requests with equal keys address the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// GET key for a URL, used for pre-cached assets.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// SHA-256 hex digest used as the primary storage key.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
