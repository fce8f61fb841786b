use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use pulse_core::error::{Result, PulseError};
use pulse_core::ConnId;

use crate::counter::ledger::{BroadcastReport, ClientSink, SessionLedger};
use crate::obs::GatewayMetrics;

/// Inbound events of the counter loop, processed strictly in arrival order.
pub enum CounterEvent {
    Connect { id: ConnId, sink: ClientSink },
    Disconnect { id: ConnId },
    Snapshot { reply: oneshot::Sender<u64> },
}

/// Single owner of the session ledger.
///
/// Runs as one task; every count mutation and its broadcast complete before
/// the next event is read, so no locking is involved.
pub struct CounterService {
    ledger: SessionLedger,
    metrics: Arc<GatewayMetrics>,
    rx: mpsc::UnboundedReceiver<CounterEvent>,
}

impl CounterService {
    async fn run(mut self) {
        tracing::debug!("counter service started");
        while let Some(ev) = self.rx.recv().await {
            self.handle(ev);
        }
        tracing::debug!(active = self.ledger.count(), "counter service stopped");
    }

    fn handle(&mut self, ev: CounterEvent) {
        match ev {
            CounterEvent::Connect { id, sink } => self.on_connect(id, sink),
            CounterEvent::Disconnect { id } => self.on_disconnect(id),
            CounterEvent::Snapshot { reply } => {
                let _ = reply.send(self.ledger.count());
            }
        }
    }

    fn on_connect(&mut self, id: ConnId, sink: ClientSink) {
        let Some(count) = self.ledger.connect(id, sink) else {
            tracing::debug!(conn = %id, "duplicate connect ignored");
            return;
        };
        tracing::info!(conn = %id, active = count, "client connected");
        self.publish(count);
    }

    fn on_disconnect(&mut self, id: ConnId) {
        let Some(count) = self.ledger.disconnect(id) else {
            tracing::debug!(conn = %id, "disconnect for inactive connection ignored");
            self.metrics.ignored_disconnects.inc(&[]);
            return;
        };
        tracing::info!(conn = %id, active = count, "client disconnected");
        self.publish(count);
    }

    fn publish(&self, count: u64) {
        let BroadcastReport { sent, dropped, closed } = self.ledger.broadcast(count);

        let m = &self.metrics;
        m.sessions_active.set(&[], i64::try_from(count).unwrap_or(i64::MAX));
        m.broadcasts.inc(&[]);
        m.broadcast_frames.add(&[("result", "sent")], sent as u64);
        m.broadcast_frames.add(&[("result", "dropped")], dropped as u64);
        m.broadcast_frames.add(&[("result", "closed")], closed as u64);
    }
}

/// Cloneable front door to the counter service.
#[derive(Clone)]
pub struct CounterHandle {
    tx: mpsc::UnboundedSender<CounterEvent>,
}

impl CounterHandle {
    /// Start the counter loop on the current runtime.
    ///
    /// The loop ends once every handle (and every `SessionGuard`) is dropped.
    pub fn spawn(metrics: Arc<GatewayMetrics>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = CounterService {
            ledger: SessionLedger::new(),
            metrics,
            rx,
        };
        tokio::spawn(service.run());
        Self { tx }
    }

    fn send(&self, ev: CounterEvent) -> Result<()> {
        self.tx.send(ev).map_err(|_| {
            tracing::warn!("counter service is gone");
            PulseError::Unavailable("counter service stopped".into())
        })
    }

    pub fn connect(&self, id: ConnId, sink: ClientSink) -> Result<()> {
        self.send(CounterEvent::Connect { id, sink })
    }

    pub fn disconnect(&self, id: ConnId) -> Result<()> {
        self.send(CounterEvent::Disconnect { id })
    }

    /// Current count, observed after every event queued before this call.
    pub async fn snapshot(&self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.send(CounterEvent::Snapshot { reply })?;
        rx.await
            .map_err(|_| PulseError::Unavailable("counter service dropped snapshot".into()))
    }

    /// Connect `id` and return a guard that disconnects it when dropped.
    pub fn register(&self, id: ConnId, sink: ClientSink) -> Result<SessionGuard> {
        self.connect(id, sink)?;
        Ok(SessionGuard {
            id,
            tx: self.tx.clone(),
        })
    }
}

/// Sends exactly one `Disconnect` for its connection, on drop.
pub struct SessionGuard {
    id: ConnId,
    tx: mpsc::UnboundedSender<CounterEvent>,
}

impl SessionGuard {
    pub fn id(&self) -> ConnId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(CounterEvent::Disconnect { id: self.id });
    }
}
