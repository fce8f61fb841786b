//! pulse core: transport-agnostic primitives shared by the gateway.
//!
//! Hosts the error surface, the connection handle type, and the text wire
//! protocol spoken with clients. It carries no runtime or transport
//! dependencies so the same types can be used by tests and tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Fallible paths surface as `PulseError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod conn;
pub mod error;
pub mod protocol;

pub use conn::{ConnId, ConnIdGen};
/// Shared result type.
pub use error::{Result, PulseError};
