//! Bridge vocabulary between the host session and the embedded editing surface.
//!
//! Outbound traffic is [`Command`] text with any request id embedded
//! literally. Inbound traffic is [`scribe_rpc::Envelope`]s whose `type` is one
//! of the [`kind`] constants; [`SurfaceEvent`] gives the spontaneous ones a
//! typed shape and the `*Response` structs describe response payloads.

#![warn(missing_docs)]

mod command;
mod event;
pub mod kind;
mod selection;

pub use command::Command;
pub use event::{
	ContentHtmlResponse, HandshakeAck, SelectionRestoredResponse, SelectionSerializedResponse, SurfaceEvent,
};
pub use selection::SerializedSelection;

/// Protocol revision reported by the surface in its handshake acknowledgement.
pub const PROTOCOL_VERSION: u32 = 1;
