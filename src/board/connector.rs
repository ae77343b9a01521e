//! WebSocket transport for the sync channel.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, future};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::ws::{Connector, FrameSink, FrameStream};
use crate::errors::SyncError;

/// Connects to the board's `/ws` endpoint. Pings are answered by the
/// transport; only text frames reach the channel.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<(FrameSink, FrameStream), SyncError> {
        let (socket, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        debug!(url = %self.url, "websocket handshake complete");

        let (sink, stream) = socket.split();
        let sink = sink
            .sink_map_err(|e| SyncError::Transport(e.to_string()))
            .with(|frame: String| future::ready(Ok::<_, SyncError>(Message::text(frame))));
        let stream = stream.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Close(_)) => Some(Err(SyncError::Closed)),
                Ok(_) => None,
                Err(e) => Some(Err(SyncError::Transport(e.to_string()))),
            })
        });
        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
