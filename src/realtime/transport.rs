//! Realtime Transport
//!
//! The channel only needs a stream of inbound frames, so the connection is
//! hidden behind [`Connector`]. [`WsConnector`] is the WebSocket implementation.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use super::error::ChannelError;

/// Close code for a normal, intentional shutdown
pub const NORMAL_CLOSURE: u16 = 1000;

/// Inbound frame as seen by the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Close frame with its status code, if the peer sent one
    Close(Option<u16>),
}

impl Frame {
    pub fn is_normal_close(&self) -> bool {
        matches!(self, Frame::Close(Some(NORMAL_CLOSURE)))
    }
}

pub type FrameStream = BoxStream<'static, Result<Frame, ChannelError>>;

/// Opens connections to the realtime endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<FrameStream, ChannelError>;
}

/// WebSocket connector backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<FrameStream, ChannelError> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        tracing::debug!(url = %url, status = %response.status(), "WebSocket handshake complete");

        let frames = stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text))),
                Ok(Message::Close(frame)) => Some(Ok(Frame::Close(frame.map(|f| u16::from(f.code))))),
                // Binary frames are not part of the protocol; ping/pong is handled by tungstenite
                Ok(_) => None,
                Err(e) => Some(Err(ChannelError::Transport(e.to_string()))),
            }
        });

        Ok(frames.boxed())
    }
}
