//! Attach protocol for panemux.
//!
//! An attachment is a bidirectional stream bound to one (session, window)
//! pair. Frames are JSON objects tagged by `type`:
//!
//! - client → server: `{"type":"input","data":"..."}`, `{"type":"resize","cols":80,"rows":24}`
//! - server → client: `{"type":"output","data":"..."}`
//!
//! ## Modules
//!
//! - `frame`: frame types and the JSON codec
//! - `target`: attach target addressing and URL construction

mod frame;
mod target;

pub use frame::{ClientFrame, ServerFrame};
pub use target::{AttachTarget, attach_url};

use thiserror::Error;

/// Errors produced while encoding, decoding, or addressing frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame could not be serialized or parsed as JSON
    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The server base URL could not be parsed or joined with the attach path
    #[error("invalid attach url: {0}")]
    Url(#[from] url::ParseError),
}
