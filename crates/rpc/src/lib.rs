//! Request/response correlation over a one-way async message channel.
//!
//! The host and an embedded execution context never share a call stack: commands
//! travel out as opaque text, answers travel back as JSON envelopes on a separate
//! channel. This crate provides the protocol-agnostic pieces:
//! * [`Envelope`]: The inbound `{type, requestId?, payload}` wire shape
//! * [`RequestId`] / [`RequestIdGen`]: Unique, per-session request identifiers
//! * [`CommandSink`]: The outbound half of the channel
//! * [`Correlator`]: Pending-request table matching responses to their callers

#![warn(missing_docs)]

pub mod correlator;
pub mod envelope;
pub mod error;
pub mod id;
pub mod sink;

pub use correlator::{Correlator, Dispatch};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use id::{RequestId, RequestIdGen};
pub use serde_json::Value as JsonValue;
pub use sink::CommandSink;
