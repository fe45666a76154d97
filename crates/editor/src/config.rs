//! Session timing configuration and mount options.

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Quiet period after the last local edit before typing is considered finished.
pub const DEFAULT_TYPING_SETTLE: Duration = Duration::from_millis(400);

/// Window during which the surface's own recent snapshots are not re-applied.
pub const DEFAULT_LOCAL_CHANGE_GUARD: Duration = Duration::from_millis(200);

/// Pause between a content replace and the selection restore.
pub const DEFAULT_REMOTE_SETTLE: Duration = Duration::from_millis(150);

/// Bound on selection serialize/restore round trips.
pub const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_millis(500);

/// Bound on the start-of-session handshake probe.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Bound on fetching the current markup from the surface.
pub const DEFAULT_CONTENT_TIMEOUT: Duration = Duration::from_millis(500);

/// Timing knobs for one editing session. All values are milliseconds.
///
/// ```toml
/// typing_settle_ms = 400
/// local_change_guard_ms = 200
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	pub typing_settle_ms: u64,
	pub local_change_guard_ms: u64,
	pub remote_settle_ms: u64,
	pub selection_timeout_ms: u64,
	pub handshake_timeout_ms: u64,
	pub content_timeout_ms: u64,
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			typing_settle_ms: millis(DEFAULT_TYPING_SETTLE),
			local_change_guard_ms: millis(DEFAULT_LOCAL_CHANGE_GUARD),
			remote_settle_ms: millis(DEFAULT_REMOTE_SETTLE),
			selection_timeout_ms: millis(DEFAULT_SELECTION_TIMEOUT),
			handshake_timeout_ms: millis(DEFAULT_HANDSHAKE_TIMEOUT),
			content_timeout_ms: millis(DEFAULT_CONTENT_TIMEOUT),
		}
	}
}

impl SessionConfig {
	/// Parses and validates a TOML document. Missing keys take their defaults.
	///
	/// # Errors
	///
	/// - [`Error::Config`] if the text is not valid TOML or has unknown keys.
	/// - [`Error::InvalidConfig`] if a value violates a constraint.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks that every duration is non-zero and the echo guard fits inside the
	/// typing settle window.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidConfig`] naming the first offending field.
	pub fn validate(&self) -> Result<()> {
		let fields = [
			("typing_settle_ms", self.typing_settle_ms),
			("local_change_guard_ms", self.local_change_guard_ms),
			("remote_settle_ms", self.remote_settle_ms),
			("selection_timeout_ms", self.selection_timeout_ms),
			("handshake_timeout_ms", self.handshake_timeout_ms),
			("content_timeout_ms", self.content_timeout_ms),
		];
		if let Some(&(field, _)) = fields.iter().find(|(_, ms)| *ms == 0) {
			return Err(Error::InvalidConfig {
				field,
				reason: "must be greater than zero",
			});
		}
		if self.local_change_guard_ms > self.typing_settle_ms {
			return Err(Error::InvalidConfig {
				field: "local_change_guard_ms",
				reason: "must not exceed typing_settle_ms",
			});
		}
		Ok(())
	}

	pub fn typing_settle(&self) -> Duration {
		Duration::from_millis(self.typing_settle_ms)
	}

	pub fn local_change_guard(&self) -> Duration {
		Duration::from_millis(self.local_change_guard_ms)
	}

	pub fn remote_settle(&self) -> Duration {
		Duration::from_millis(self.remote_settle_ms)
	}

	pub fn selection_timeout(&self) -> Duration {
		Duration::from_millis(self.selection_timeout_ms)
	}

	pub fn handshake_timeout(&self) -> Duration {
		Duration::from_millis(self.handshake_timeout_ms)
	}

	pub fn content_timeout(&self) -> Duration {
		Duration::from_millis(self.content_timeout_ms)
	}
}

/// What the hosting screen mounts the surface with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
	/// Markup shown when the session starts.
	pub initial_content: String,
	/// Whether the user may edit.
	pub editable: bool,
	/// Text shown while the document is empty.
	pub placeholder: String,
}

impl Default for EditorOptions {
	fn default() -> Self {
		Self {
			initial_content: String::new(),
			editable: true,
			placeholder: String::new(),
		}
	}
}

impl EditorOptions {
	/// Editable options starting from `initial_content`.
	pub fn new(initial_content: impl Into<String>) -> Self {
		Self {
			initial_content: initial_content.into(),
			..Self::default()
		}
	}

	pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = placeholder.into();
		self
	}

	pub fn read_only(mut self) -> Self {
		self.editable = false;
		self
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
		assert_eq!(SessionConfig::default().typing_settle(), DEFAULT_TYPING_SETTLE);
	}

	#[test]
	fn oversized_durations_saturate() {
		assert_eq!(millis(Duration::from_millis(400)), 400);
		assert_eq!(millis(Duration::MAX), u64::MAX);
	}

	#[test]
	fn partial_document_overrides_named_fields() {
		let config = SessionConfig::from_toml_str("typing_settle_ms = 600\nremote_settle_ms = 50\n").unwrap();
		assert_eq!(config.typing_settle(), Duration::from_millis(600));
		assert_eq!(config.remote_settle(), Duration::from_millis(50));
		assert_eq!(config.local_change_guard(), DEFAULT_LOCAL_CHANGE_GUARD);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(matches!(
			SessionConfig::from_toml_str("debounce_ms = 10"),
			Err(Error::Config(_))
		));
	}

	#[test]
	fn zero_durations_are_rejected() {
		let err = SessionConfig::from_toml_str("selection_timeout_ms = 0").unwrap_err();
		assert!(matches!(
			err,
			Error::InvalidConfig {
				field: "selection_timeout_ms",
				..
			}
		));
	}

	#[test]
	fn guard_longer_than_settle_is_rejected() {
		let err = SessionConfig::from_toml_str("typing_settle_ms = 100\nlocal_change_guard_ms = 150").unwrap_err();
		assert!(matches!(
			err,
			Error::InvalidConfig {
				field: "local_change_guard_ms",
				..
			}
		));
	}
}
