use std::collections::hash_map::Entry;
use std::collections::HashMap;

use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

use pulse_core::protocol::ServerFrame;
use pulse_core::ConnId;

/// One connection's outbound queue.
pub type ClientSink = mpsc::Sender<Message>;

/// Per-recipient outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    /// Recipient queue was full; the frame was discarded.
    pub dropped: usize,
    /// Recipient writer already gone; its disconnect is on the way.
    pub closed: usize,
}

/// Connection bookkeeping: the session count plus the set of live handles.
///
/// `count` always equals `active.len()`. Only handles present in `active`
/// can decrement, which makes unmatched and repeated disconnects no-ops.
#[derive(Default)]
pub struct SessionLedger {
    count: u64,
    active: HashMap<ConnId, ClientSink>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_active(&self, id: ConnId) -> bool {
        self.active.contains_key(&id)
    }

    /// Register `id`. Returns the new count, or `None` if `id` was already live.
    pub fn connect(&mut self, id: ConnId, sink: ClientSink) -> Option<u64> {
        match self.active.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(sink);
                self.count += 1;
                Some(self.count)
            }
        }
    }

    /// Unregister `id`. Returns the new count, or `None` if `id` was not live.
    pub fn disconnect(&mut self, id: ConnId) -> Option<u64> {
        self.active.remove(&id)?;
        match self.count.checked_sub(1) {
            Some(n) => self.count = n,
            None => {
                tracing::error!(conn = %id, "session count underflow");
                debug_assert!(false, "session count underflow on {id}");
                self.count = self.active.len() as u64;
            }
        }
        Some(self.count)
    }

    /// Push `activeSessions(count)` to every live connection. Never blocks.
    pub fn broadcast(&self, count: u64) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let text = match ServerFrame::ActiveSessions(count).encode() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "broadcast frame encode failed");
                return report;
            }
        };

        for (id, sink) in &self.active {
            match sink.try_send(Message::Text(text.clone())) {
                Ok(()) => report.sent += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(conn = %id, "outbound queue full, count update dropped");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => report.closed += 1,
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (ClientSink, mpsc::Receiver<Message>) {
        mpsc::channel(8)
    }

    #[test]
    fn duplicate_connect_is_ignored() {
        let mut l = SessionLedger::new();
        let (tx, _rx) = sink();
        assert_eq!(l.connect(ConnId::from_raw(1), tx.clone()), Some(1));
        assert_eq!(l.connect(ConnId::from_raw(1), tx), None);
        assert_eq!(l.count(), 1);
    }

    #[test]
    fn unmatched_disconnect_is_ignored() {
        let mut l = SessionLedger::new();
        assert_eq!(l.disconnect(ConnId::from_raw(7)), None);
        assert_eq!(l.count(), 0);
    }

    #[test]
    fn disconnect_twice_decrements_once() {
        let mut l = SessionLedger::new();
        let (tx, _rx) = sink();
        l.connect(ConnId::from_raw(1), tx);
        assert_eq!(l.disconnect(ConnId::from_raw(1)), Some(0));
        assert_eq!(l.disconnect(ConnId::from_raw(1)), None);
        assert_eq!(l.count(), 0);
        assert!(!l.is_active(ConnId::from_raw(1)));
    }

    #[test]
    fn broadcast_reports_full_and_closed_queues() {
        let mut l = SessionLedger::new();

        let (open, mut open_rx) = sink();
        let (full, _full_rx) = mpsc::channel(1);
        full.try_send(Message::Text("filler".into())).unwrap();
        let (closed, closed_rx) = sink();
        drop(closed_rx);

        l.connect(ConnId::from_raw(1), open);
        l.connect(ConnId::from_raw(2), full);
        l.connect(ConnId::from_raw(3), closed);

        let report = l.broadcast(l.count());
        assert_eq!(report, BroadcastReport { sent: 1, dropped: 1, closed: 1 });

        match open_rx.try_recv().unwrap() {
            Message::Text(s) => assert_eq!(s, r#"{"v":1,"type":"activeSessions","data":3}"#),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
