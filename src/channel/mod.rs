//! Command channel.
//!
//! Persistent connection to the dev server. The connection itself is opened
//! by a `Connector`; what arrives is handed to the dispatcher as a stream of
//! `ChannelEvent`s.
//!
//! # Architecture
//!
//! ```text
//! dev server --[text frame]--> reader thread --[ChannelEvent]--> dispatcher
//! ```

mod command;
mod ws;

pub use command::Command;
pub use ws::WsConnector;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ReloadError;

/// What one connection delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text frame
    Message(String),
    /// The connection ended; no further events follow
    Closed(String),
}

/// What the dispatcher does once the connection is lost.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelLossPolicy {
    /// Stop dispatching; the active module keeps running.
    #[default]
    Abandon,
    /// Wait `delay`, then connect again until it succeeds or the client stops.
    Reconnect { delay: Duration },
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Single connection attempt.
    ///
    /// The receiver yields events until the connection ends. Dropping it
    /// closes the connection.
    async fn connect(&self, endpoint: &str) -> Result<mpsc::Receiver<ChannelEvent>, ReloadError>;
}
