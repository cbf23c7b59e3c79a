//! `[channel]` section configuration.
//!
//! ```toml
//! [channel]
//! endpoint = "ws://localhost:17777/"   # command channel socket
//! reconnect = false                    # reopen the socket after it closes
//! reconnect_delay_ms = 1000            # wait between reconnect attempts
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelLossPolicy;

/// Command channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// WebSocket endpoint of the development server.
    pub endpoint: String,

    /// Reopen the channel after it is lost.
    /// - `false` (default): the channel is gone for the rest of the session
    /// - `true`: retry every `reconnect_delay_ms`
    pub reconnect: bool,

    /// Delay between reconnect attempts.
    pub reconnect_delay_ms: u64,
}

impl ChannelConfig {
    pub fn loss_policy(&self) -> ChannelLossPolicy {
        if self.reconnect {
            ChannelLossPolicy::Reconnect {
                delay: Duration::from_millis(self.reconnect_delay_ms),
            }
        } else {
            ChannelLossPolicy::Abandon
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:17777/".into(),
            reconnect: false,
            reconnect_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::channel::ChannelLossPolicy;
    use crate::config::test_parse_config;

    #[test]
    fn test_channel_defaults_abandon() {
        let config = test_parse_config("");
        assert_eq!(config.channel.endpoint, "ws://localhost:17777/");
        assert_eq!(config.channel.loss_policy(), ChannelLossPolicy::Abandon);
    }

    #[test]
    fn test_channel_reconnect_policy() {
        let config = test_parse_config("[channel]\nreconnect = true\nreconnect_delay_ms = 250");
        assert_eq!(
            config.channel.loss_policy(),
            ChannelLossPolicy::Reconnect {
                delay: Duration::from_millis(250)
            }
        );
    }
}
