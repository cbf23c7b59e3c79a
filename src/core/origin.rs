//! Page origin: the scheme + host + port that relative paths resolve against.
//!
//! The browser derives this from `location`; a native client is told which
//! dev server it is attached to.

use std::fmt;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum OriginError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    #[error("`{0}` has no host")]
    NoHost(String),

    #[error("unsupported scheme `{0}` (expected http or https)")]
    Scheme(String),
}

/// Origin of the page, e.g. `https://dev.local:3000`.
///
/// Invariants:
/// - Scheme is `http` or `https`
/// - Serialized form has no trailing slash and omits the default port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    base: Url,
    serialized: String,
}

impl PageOrigin {
    pub fn parse(input: &str) -> Result<Self, OriginError> {
        let url = Url::parse(input.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OriginError::Scheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(OriginError::NoHost(input.to_string()));
        }

        let serialized = url.origin().ascii_serialization();
        let base = Url::parse(&format!("{serialized}/"))?;
        Ok(Self { base, serialized })
    }

    /// `https://host:port`, no trailing slash.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Map a `/`-relative path onto this origin; anything else is returned as-is.
    pub fn absolutize(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.serialized, path)
        } else {
            path.to_string()
        }
    }

    /// Resolve an address the way a page would: absolute URLs stay, paths join the origin.
    pub fn resolve(&self, address: &str) -> Result<Url, url::ParseError> {
        match Url::parse(address) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base.join(address),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for PageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_strips_path_and_default_port() {
        let origin = PageOrigin::parse("https://dev.local:443/some/page?x=1").unwrap();
        assert_eq!(origin.as_str(), "https://dev.local");

        let origin = PageOrigin::parse("http://localhost:7777/").unwrap();
        assert_eq!(origin.as_str(), "http://localhost:7777");
    }

    #[test]
    fn test_origin_rejects_non_http() {
        assert!(matches!(
            PageOrigin::parse("ws://localhost:17777"),
            Err(OriginError::Scheme(_))
        ));
        assert!(matches!(
            PageOrigin::parse("localhost"),
            Err(OriginError::Parse(_))
        ));
    }

    #[test]
    fn test_absolutize() {
        let origin = PageOrigin::parse("https://dev.local:3000").unwrap();
        assert_eq!(origin.absolutize("/a.js"), "https://dev.local:3000/a.js");
        assert_eq!(origin.absolutize("https://x/b.js"), "https://x/b.js");
        assert_eq!(origin.absolutize("relative.js"), "relative.js");
    }

    #[test]
    fn test_resolve() {
        let origin = PageOrigin::parse("http://localhost:7777").unwrap();
        assert_eq!(
            origin.resolve("/app.so").unwrap().as_str(),
            "http://localhost:7777/app.so"
        );
        assert_eq!(
            origin.resolve("file:///tmp/app.so").unwrap().as_str(),
            "file:///tmp/app.so"
        );
    }
}
