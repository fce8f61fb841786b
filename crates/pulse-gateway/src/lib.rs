//! pulse gateway library entry.
//!
//! Wires config, the connection counter, the WebSocket transport, and the
//! HTTP routes into one server. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod counter;
pub mod obs;
pub mod router;
pub mod routes;
pub mod transport;
