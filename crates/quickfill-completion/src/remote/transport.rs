//! Channel abstraction and the WebSocket implementation

use super::state::{CLOSE_ABNORMAL, CLOSE_NO_STATUS};
use crate::types::{CompletionError, CompletionResult};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

/// Something that happened on an open channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text payload
    Message(String),
    /// The channel is gone; no further events follow
    Closed(u16),
    /// Transport failure; a `Closed` event follows
    Error(String),
}

/// A bidirectional text channel to the backend
#[async_trait]
pub trait DuplexChannel: Send {
    async fn send(&mut self, text: String) -> CompletionResult<()>;

    /// Wait for the next event; must be cancel-safe
    async fn next_event(&mut self) -> ChannelEvent;

    async fn close(&mut self, code: u16, reason: &str) -> CompletionResult<()>;
}

/// Opens channels to an endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> CompletionResult<Box<dyn DuplexChannel>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production connector backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &str) -> CompletionResult<Box<dyn DuplexChannel>> {
        let (stream, response) = connect_async(endpoint)
            .await
            .map_err(|e| CompletionError::ConnectionError(e.to_string()))?;
        debug!(endpoint, status = %response.status(), "WebSocket handshake complete");

        let (sink, stream) = stream.split();
        Ok(Box::new(WebSocketChannel {
            sink,
            stream,
            failed: false,
        }))
    }
}

struct WebSocketChannel {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    failed: bool,
}

#[async_trait]
impl DuplexChannel for WebSocketChannel {
    async fn send(&mut self, text: String) -> CompletionResult<()> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| CompletionError::ConnectionError(e.to_string()))
    }

    async fn next_event(&mut self) -> ChannelEvent {
        if self.failed {
            return ChannelEvent::Closed(CLOSE_ABNORMAL);
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return ChannelEvent::Message(text),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return ChannelEvent::Message(text),
                    Err(e) => trace!("Dropping non-UTF-8 binary frame: {}", e),
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame
                        .map(|f| u16::from(f.code))
                        .unwrap_or(CLOSE_NO_STATUS);
                    return ChannelEvent::Closed(code);
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    trace!("Control frame");
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    self.failed = true;
                    return ChannelEvent::Error(e.to_string());
                }
                None => return ChannelEvent::Closed(CLOSE_ABNORMAL),
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> CompletionResult<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| CompletionError::ConnectionError(e.to_string()))
    }
}
