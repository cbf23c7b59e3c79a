//! Command envelopes.
//!
//! ```json
//! {"type": "revalidate", "paths": ["/a.js", "https://x/b.js"]}
//! {"type": "files", "files": ["/a.js", "/b.js"]}
//! ```
//!
//! Any other `type` decodes to `Unknown`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    /// These resources changed
    Revalidate {
        #[serde(default)]
        paths: Vec<String>,
    },

    /// Snapshot of the files the server currently tracks (advisory)
    Files {
        #[serde(default)]
        files: Vec<String>,
    },

    #[serde(other)]
    Unknown,
}

impl Command {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_revalidate() {
        let cmd = Command::decode(r#"{"type":"revalidate","paths":["/a.js","https://x/b.js"]}"#)
            .unwrap();
        assert_eq!(
            cmd,
            Command::Revalidate {
                paths: vec!["/a.js".into(), "https://x/b.js".into()]
            }
        );
    }

    #[test]
    fn test_decode_files() {
        let cmd = Command::decode(r#"{"type":"files","files":["/a.js"]}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Files {
                files: vec!["/a.js".into()]
            }
        );
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        assert_eq!(
            Command::decode(r#"{"type":"ping","ts":1}"#).unwrap(),
            Command::Unknown
        );
    }

    #[test]
    fn test_malformed_frames() {
        assert!(Command::decode("not json").is_err());
        assert!(Command::decode(r#"{"paths":[]}"#).is_err());
    }
}
