//! Text wire protocol.
//!
//! The counter channel is push-only: the server sends `activeSessions` frames
//! whenever the count changes. Clients may send `ping` frames; anything else
//! is accepted and ignored. Parsers never panic on hostile input and report
//! malformed frames as `PulseError`.

pub mod text;

pub use text::{ClientFrame, ServerFrame, PROTOCOL_VERSION};
