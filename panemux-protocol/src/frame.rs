//! Frame types and JSON codec

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Frames sent from the client to the attach server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Keystrokes or pasted text for the attached window
    Input { data: String },
    /// New terminal geometry for the attached window
    Resize { cols: u16, rows: u16 },
}

impl ClientFrame {
    /// Build an input frame from raw bytes (lossy UTF-8)
    pub fn input(bytes: &[u8]) -> Self {
        ClientFrame::Input {
            data: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames received from the attach server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Terminal output for the attached window
    Output { data: String },
    /// Any frame type this client does not understand
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Decode a JSON text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_frame_wire_shape() {
        let json = ClientFrame::input(b"ls -la\r").encode().unwrap();
        assert_eq!(json, r#"{"type":"input","data":"ls -la\r"}"#);
    }

    #[test]
    fn test_resize_frame_wire_shape() {
        let json = ClientFrame::Resize { cols: 120, rows: 40 }.encode().unwrap();
        assert_eq!(json, r#"{"type":"resize","cols":120,"rows":40}"#);
    }

    #[test]
    fn test_decode_output() {
        let frame = ServerFrame::decode(r#"{"type":"output","data":"\u001b[1mhi"}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Output {
                data: "\u{1b}[1mhi".to_string()
            }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let frame = ServerFrame::decode(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Unknown);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        assert!(matches!(
            ServerFrame::decode("not json"),
            Err(ProtocolError::Codec(_))
        ));
    }

    #[test]
    fn test_input_from_invalid_utf8_is_lossy() {
        let frame = ClientFrame::input(&[b'a', 0xff, b'b']);
        assert_eq!(
            frame,
            ClientFrame::Input {
                data: "a\u{fffd}b".to_string()
            }
        );
    }
}
