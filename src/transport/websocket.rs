//! WebSocket connector backed by tokio-tungstenite.
//!
//! Frames are JSON text messages. Binary messages from the server are treated
//! as raw output bytes. Control frames are handled by tungstenite and skipped.

use super::{Connector, FrameStream, TransportError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use panemux_config::Config;
use panemux_protocol::{AttachTarget, ClientFrame, ServerFrame, attach_url};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens `{server_url}{attach_path}?session=<name>&window=<index>`
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    server_url: String,
    attach_path: String,
}

impl WebSocketConnector {
    pub fn new(server_url: impl Into<String>, attach_path: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            attach_path: attach_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_url.clone(), config.attach_path.clone())
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, target: &AttachTarget) -> Result<Box<dyn FrameStream>, TransportError> {
        let url = attach_url(&self.server_url, &self.attach_path, target)?;
        log::debug!("Opening attachment {} at {}", target, url);

        let (socket, _response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Open {
                    target: target.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Box::new(WebSocketFrameStream { socket }))
    }
}

struct WebSocketFrameStream {
    socket: Socket,
}

#[async_trait]
impl FrameStream for WebSocketFrameStream {
    async fn send(&mut self, frame: ClientFrame) -> Result<(), TransportError> {
        let text = frame.encode()?;
        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<ServerFrame, TransportError>> {
        loop {
            let message = match self.socket.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Recv(e.to_string()))),
            };
            match message {
                Message::Text(text) => match ServerFrame::decode(&text) {
                    Ok(frame) => return Some(Ok(frame)),
                    Err(e) => log::warn!("Dropping undecodable frame: {}", e),
                },
                Message::Binary(bytes) => {
                    return Some(Ok(ServerFrame::Output {
                        data: String::from_utf8_lossy(&bytes).into_owned(),
                    }));
                }
                Message::Close(frame) => {
                    log::debug!("Server closed attachment: {:?}", frame);
                    return None;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            log::trace!("Ignoring close error: {}", e);
        }
    }
}
