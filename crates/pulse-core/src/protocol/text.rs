//! JSON frames exchanged over the text lane.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, PulseError};

/// Current protocol version, carried as `v` in every frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerFrame {
    /// Current number of open connections.
    #[serde(rename = "activeSessions")]
    ActiveSessions(u64),
    /// Reply to a client `ping`.
    #[serde(rename = "pong")]
    Pong,
    /// Sent right before the server closes a session.
    #[serde(rename = "error")]
    Error { code: String, msg: String },
}

#[derive(Serialize)]
struct Versioned<'a> {
    v: u8,
    #[serde(flatten)]
    frame: &'a ServerFrame,
}

impl ServerFrame {
    pub fn error(code: &str, msg: &str) -> Self {
        ServerFrame::Error {
            code: code.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(&Versioned {
            v: PROTOCOL_VERSION,
            frame: self,
        })
        .map_err(|e| PulseError::Internal(format!("frame encode failed: {e}")))
    }
}

/// Frames sent by clients. Unknown fields are tolerated.
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    #[serde(default = "default_version")]
    pub v: u8,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: Option<Value>,
}

fn default_version() -> u8 {
    PROTOCOL_VERSION
}

impl ClientFrame {
    pub fn decode(s: &str) -> Result<Self> {
        let frame: ClientFrame = serde_json::from_str(s)
            .map_err(|e| PulseError::BadRequest(format!("invalid frame json: {e}")))?;
        if frame.v != PROTOCOL_VERSION {
            return Err(PulseError::UnsupportedVersion);
        }
        Ok(frame)
    }

    pub fn is_ping(&self) -> bool {
        self.msg_type == "ping"
    }
}
