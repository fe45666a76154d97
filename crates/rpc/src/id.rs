//! Request identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counter-based sequence generator.
#[derive(Debug, Default, Clone, Copy)]
struct CounterIdGen(u64);

impl CounterIdGen {
	const fn new() -> Self {
		Self(0)
	}

	/// Returns the current value and increments the counter.
	fn next(&mut self) -> u64 {
		let id = self.0;
		self.0 += 1;
		id
	}
}

/// Identifier embedded literally in an outbound command and echoed back by the
/// embedded context in its response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
	/// Wraps an existing identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the identifier text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RequestId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for RequestId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Generates `"{prefix}-{n}"` identifiers.
///
/// Each session owns its own generator, so identifiers never collide across
/// concurrently mounted surfaces even though every counter starts at 0.
#[derive(Debug, Clone)]
pub struct RequestIdGen {
	prefix: String,
	counter: CounterIdGen,
}

impl RequestIdGen {
	/// Creates a generator with a fixed prefix.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			counter: CounterIdGen::new(),
		}
	}

	/// Creates a generator with a random 8-character prefix.
	pub fn random() -> Self {
		let uuid = uuid::Uuid::new_v4().simple().to_string();
		Self::new(&uuid[..8])
	}

	/// Returns the prefix shared by every identifier from this generator.
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Generates the next unique identifier.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> RequestId {
		RequestId(format!("{}-{}", self.prefix, self.counter.next()))
	}
}
