//! Attachment transport seam.
//!
//! An Attachment never opens sockets itself. It asks a [`Connector`] for a
//! [`FrameStream`] bound to one (session, window) target and pumps frames
//! through it. The production connector speaks WebSocket
//! ([`WebSocketConnector`]); tests substitute scripted connectors.

mod websocket;

pub use websocket::WebSocketConnector;

use async_trait::async_trait;
use panemux_protocol::{AttachTarget, ClientFrame, ProtocolError, ServerFrame};
use thiserror::Error;

/// Failures of the underlying stream. These stay inside the Attachment's
/// retry loop and are only ever logged.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The stream could not be opened
    #[error("failed to open attachment {target}: {reason}")]
    Open { target: String, reason: String },

    /// Writing a frame failed
    #[error("send failed: {0}")]
    Send(String),

    /// Reading from the stream failed
    #[error("receive failed: {0}")]
    Recv(String),

    /// Frame encoding or URL construction failed
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// An open, bidirectional frame stream for one attach target
#[async_trait]
pub trait FrameStream: Send {
    /// Send one frame to the server
    async fn send(&mut self, frame: ClientFrame) -> Result<(), TransportError>;

    /// Receive the next frame; `None` once the stream has closed.
    ///
    /// Must be cancel-safe: the attachment worker races it against commands.
    async fn recv(&mut self) -> Option<Result<ServerFrame, TransportError>>;

    /// Close the stream; errors are ignored
    async fn close(&mut self);
}

/// Opens frame streams for attach targets
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, target: &AttachTarget) -> Result<Box<dyn FrameStream>, TransportError>;
}
