//! Decode-once codec for the transport layer.
//!
//! - Text frames => `ClientFrame`
//! - Binary frames are not part of the protocol and are ignored
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use pulse_core::{error::Result, protocol::ClientFrame};

#[derive(Debug)]
pub enum Inbound {
    Frame(ClientFrame),
    Ignored,
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Ok(Inbound::Frame(ClientFrame::decode(&s)?)),
        Message::Binary(_) => Ok(Inbound::Ignored),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_ping_decodes_to_frame() {
        match decode(Message::Text(r#"{"v":1,"type":"ping"}"#.into())).unwrap() {
            Inbound::Frame(f) => assert!(f.is_ping()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn binary_is_ignored() {
        assert!(matches!(decode(Message::Binary(vec![1, 2, 3])).unwrap(), Inbound::Ignored));
    }

    #[test]
    fn close_is_surfaced() {
        assert!(matches!(decode(Message::Close(None)).unwrap(), Inbound::Close));
    }

    #[test]
    fn bad_text_is_an_error() {
        assert!(decode(Message::Text("nope".into())).is_err());
    }
}
