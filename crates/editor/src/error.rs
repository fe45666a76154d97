//! Error types for editing sessions.

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors surfaced to the hosting screen.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The session task has stopped; the handle is stale.
	#[error("editing session closed")]
	SessionClosed,
	/// Configuration text could not be parsed.
	#[error("failed to parse session config: {0}")]
	Config(#[from] toml::de::Error),
	/// Configuration parsed but violates a constraint.
	#[error("invalid session config: `{field}` {reason}")]
	InvalidConfig {
		/// Offending field.
		field: &'static str,
		/// Constraint that was violated.
		reason: &'static str,
	},
	/// The bridge to the embedded surface failed.
	#[error(transparent)]
	Bridge(#[from] scribe_rpc::Error),
}
