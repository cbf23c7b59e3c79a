//! WebSocket connector.
//!
//! The socket is blocking `tungstenite`, so it lives on its own reader
//! thread which forwards text frames into a tokio channel. The read timeout
//! lets that thread notice a dropped receiver and exit.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tungstenite::protocol::Message;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::WebSocket;

use super::{ChannelEvent, Connector};
use crate::error::ReloadError;

const READ_POLL: Duration = Duration::from_millis(200);
const EVENT_BUFFER: usize = 64;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<mpsc::Receiver<ChannelEvent>, ReloadError> {
        let target = endpoint.to_string();
        let socket = tokio::task::spawn_blocking(move || tungstenite::connect(target.as_str()))
            .await
            .map_err(|e| ReloadError::channel_unavailable(endpoint, e))?
            .map_err(|e| ReloadError::channel_unavailable(endpoint, e))?
            .0;

        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            stream
                .set_read_timeout(Some(READ_POLL))
                .map_err(|e| ReloadError::channel_unavailable(endpoint, e))?;
        } else {
            return Err(ReloadError::channel_unavailable(
                endpoint,
                anyhow!("only plain ws:// connections are supported"),
            ));
        }

        crate::debug!("channel"; "connected to {}", endpoint);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        std::thread::spawn(move || reader_loop(socket, tx));
        Ok(rx)
    }
}

/// Forward frames until the connection ends or the receiver is gone.
fn reader_loop(mut socket: Socket, tx: mpsc::Sender<ChannelEvent>) {
    loop {
        if tx.is_closed() {
            let _ = socket.close(None);
            let _ = socket.flush();
            return;
        }

        let event = match socket.read() {
            Ok(Message::Text(text)) => ChannelEvent::Message(text.as_str().to_owned()),
            Ok(Message::Close(frame)) => ChannelEvent::Closed(
                frame
                    .map(|f| f.reason.as_str().to_owned())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "closed by server".into()),
            ),
            // Pings are answered by tungstenite on the next read
            Ok(_) => continue,
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue;
            }
            Err(e) => ChannelEvent::Closed(e.to_string()),
        };

        let closed = matches!(event, ChannelEvent::Closed(_));
        if tx.blocking_send(event).is_err() || closed {
            return;
        }
    }
}
