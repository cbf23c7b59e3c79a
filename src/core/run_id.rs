//! Run correlation id.
//!
//! Appended to the module address to defeat URL-keyed caches and used to
//! tag log lines of one activation.

use std::fmt;

use url::Url;

const NOCACHE_PREFIX: &str = "nocache-";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Fresh random id, `nocache-` prefixed when the caller bypasses caches.
    pub fn generate(nocache: bool) -> Self {
        let suffix = format!("{:016x}", rand::random::<u64>());
        if nocache {
            Self(format!("{NOCACHE_PREFIX}{suffix}"))
        } else {
            Self(suffix)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_nocache(&self) -> bool {
        self.0.starts_with(NOCACHE_PREFIX)
    }

    /// Copy of `url` with this id appended to its query.
    pub fn apply_to(&self, url: &Url) -> Url {
        let mut tagged = url.clone();
        let query = match url.query() {
            Some(q) if !q.is_empty() => format!("{q}&{}", self.0),
            _ => self.0.clone(),
        };
        tagged.set_query(Some(&query));
        tagged
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
