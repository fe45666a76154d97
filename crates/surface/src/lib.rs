//! Reference embedded editing surface.
//!
//! This is the far side of the bridge: an isolated document with its own event
//! loop that receives [`scribe_protocol::Command`] text and posts
//! [`scribe_rpc::Envelope`]s back. It computes and resolves structural
//! selection paths exactly as an embedded script would, and reports edits and
//! content replaces as `contentChange` events. It does no layout or rendering.
//!
//! [`spawn_surface`] starts the loop and returns the host-side channel ends plus
//! a [`SurfaceHandle`] for driving simulated user input.

mod document;
mod markup;
mod runtime;
mod surface;

pub use document::{Document, Node, NodeContent, NodeId, Point};
pub use runtime::{BridgeEnds, SurfaceHandle, SurfaceOptions, SurfaceSnapshot, spawn_surface};
pub use surface::{LiveSelection, Surface};

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors when driving a surface from the outside.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The surface loop has stopped.
	#[error("surface stopped")]
	Stopped,
}
