//! Error types for bridge requests.

use crate::RequestId;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible bridge errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// No response arrived before the request deadline.
	#[error("bridge request {0} timed out")]
	Timeout(RequestId),
	/// The pending entry was torn down before a response arrived.
	#[error("bridge request {0} was cancelled")]
	Cancelled(RequestId),
	/// The outbound channel to the embedded context is gone.
	#[error("bridge channel closed")]
	ChannelClosed,
	/// A message could not be encoded or decoded.
	#[error("malformed bridge message: {0}")]
	Malformed(#[from] serde_json::Error),
}
