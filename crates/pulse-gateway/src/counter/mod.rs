//! Connection counter: tracks open realtime connections and pushes the
//! current count to all of them on every change.

mod ledger;
mod service;

pub use ledger::{BroadcastReport, ClientSink, SessionLedger};
pub use service::{CounterEvent, CounterHandle, SessionGuard};
