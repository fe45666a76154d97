//! Edit state coordinator with owned pending state.
//!
//! [`EditCoordinator`] decides, for every local edit and every externally
//! supplied snapshot, whether the surface content may be replaced now, must
//! wait in the single pending slot, or must be ignored.
//!
//! # Phases
//!
//! - [`EditPhase::Idle`]: remote content applies immediately.
//! - [`EditPhase::LocalEditing`]: the user is typing; remote content is
//!   deferred until the settle deadline passes without further edits.
//! - [`EditPhase::ApplyingRemote`]: a replace is in flight; further remote
//!   content is deferred. Typing here is accepted and resumes
//!   [`EditPhase::LocalEditing`] once the replace finishes.
//!
//! # Guard windows
//!
//! - Local echo guard: opened by each accepted local edit. A remote request
//!   carrying a snapshot the surface reported inside the window is the host
//!   echoing the user's own edit back and is suppressed.
//! - Replace echo guard: the surface reports each replace as one content
//!   change, which must not read as user typing. One change is absorbed per
//!   replace. If an apply finishes before its report arrived, the guard stays
//!   open for that change, bounded by the echo window.
//!
//! The coordinator holds no clock; every call takes `now`.

use std::hash::BuildHasher;
use std::time::Duration;

use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::SessionConfig;

/// Snapshots remembered by the local echo guard.
const ECHO_CAPACITY: usize = 4;

/// Current phase of the session's edit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
	/// Nothing in progress.
	Idle,
	/// The user is typing; settled once `settle_at` passes without edits.
	LocalEditing {
		/// Deadline restarted by every accepted local edit.
		settle_at: Instant,
	},
	/// Remote content is being swapped in.
	ApplyingRemote,
}

/// How a reported local change was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalChange {
	/// Identical to the last known content.
	Ignored,
	/// A user edit: recorded, typing state entered, should be reported to the host.
	Accepted,
	/// The surface reporting a remote replace: recorded, not reported.
	Absorbed,
}

/// How a remote content request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyDecision {
	/// Identical to the current content; nothing to do.
	Unchanged,
	/// An echo of a snapshot the surface itself just reported.
	Suppressed,
	/// Queued in the pending slot, replacing anything already there.
	Deferred,
	/// The session entered [`EditPhase::ApplyingRemote`]; the caller must
	/// start the reconcile.
	Applied,
}

#[derive(Debug, Default)]
struct EchoGuard {
	until: Option<Instant>,
	fingerprints: SmallVec<[u64; ECHO_CAPACITY]>,
}

impl EchoGuard {
	fn is_open(&self, now: Instant) -> bool {
		self.until.is_some_and(|until| now < until)
	}

	fn record(&mut self, fingerprint: u64, now: Instant, window: Duration) {
		if !self.is_open(now) {
			self.fingerprints.clear();
		}
		if self.fingerprints.len() == ECHO_CAPACITY {
			self.fingerprints.remove(0);
		}
		self.fingerprints.push(fingerprint);
		self.until = Some(now + window);
	}

	fn matches(&self, fingerprint: u64, now: Instant) -> bool {
		self.is_open(now) && self.fingerprints.contains(&fingerprint)
	}

	fn clear(&mut self) {
		self.until = None;
		self.fingerprints.clear();
	}
}

fn fingerprint(content: &str) -> u64 {
	FxBuildHasher.hash_one(content)
}

/// Per-session edit state machine.
#[derive(Debug)]
pub struct EditCoordinator {
	typing_settle: Duration,
	echo_window: Duration,
	phase: EditPhase,
	last_known: String,
	pending_remote: Option<String>,
	local_echo: EchoGuard,
	replace_echo_until: Option<Instant>,
	/// Replaces whose content change report has not arrived yet.
	unechoed: usize,
	/// Settle deadline of typing that happened while applying.
	typed_while_applying: Option<Instant>,
}

impl EditCoordinator {
	pub fn new(initial_content: impl Into<String>, config: &SessionConfig) -> Self {
		Self {
			typing_settle: config.typing_settle(),
			echo_window: config.local_change_guard(),
			phase: EditPhase::Idle,
			last_known: initial_content.into(),
			pending_remote: None,
			local_echo: EchoGuard::default(),
			replace_echo_until: None,
			unechoed: 0,
			typed_while_applying: None,
		}
	}

	pub fn phase(&self) -> EditPhase {
		self.phase
	}

	/// Content most recently reported by the surface or handed to it.
	pub fn last_known(&self) -> &str {
		&self.last_known
	}

	/// Snapshot waiting for the current typing burst or apply to finish.
	pub fn pending_remote(&self) -> Option<&str> {
		self.pending_remote.as_deref()
	}

	/// Returns true while the local echo guard is open.
	pub fn is_local_change(&self, now: Instant) -> bool {
		self.local_echo.is_open(now)
	}

	/// Deadline of the current typing burst, if any.
	pub fn settle_deadline(&self) -> Option<Instant> {
		match self.phase {
			EditPhase::LocalEditing { settle_at } => Some(settle_at),
			_ => None,
		}
	}

	/// Records content reported by the surface.
	pub fn notify_local_change(&mut self, content: &str, now: Instant) -> LocalChange {
		let replacing = self.take_replace_echo(now);
		if content == self.last_known {
			return LocalChange::Ignored;
		}
		self.last_known.clear();
		self.last_known.push_str(content);

		if replacing {
			trace!(phase = ?self.phase, "edit.local_change.absorbed");
			return LocalChange::Absorbed;
		}

		self.local_echo.record(fingerprint(content), now, self.echo_window);
		let settle_at = now + self.typing_settle;
		if self.phase == EditPhase::ApplyingRemote {
			debug!("edit.typing.while_applying");
			self.typed_while_applying = Some(settle_at);
			return LocalChange::Accepted;
		}
		if !matches!(self.phase, EditPhase::LocalEditing { .. }) {
			debug!("edit.typing.start");
		}
		self.phase = EditPhase::LocalEditing { settle_at };
		LocalChange::Accepted
	}

	/// Requests that `content` replace the surface content.
	///
	/// A request equal to the current content also discards any pending
	/// snapshot, since it is now older than what the caller asked for.
	pub fn request_apply_remote(&mut self, content: &str, now: Instant) -> ApplyDecision {
		if content == self.last_known {
			if self.pending_remote.take().is_some() {
				debug!("edit.remote.pending_dropped");
			}
			return ApplyDecision::Unchanged;
		}
		if self.local_echo.matches(fingerprint(content), now) {
			debug!("edit.remote.echo_suppressed");
			return ApplyDecision::Suppressed;
		}

		if let EditPhase::LocalEditing { settle_at } = self.phase
			&& now >= settle_at
		{
			// The settle timer has not been serviced yet; this request supersedes
			// anything that would have been handed off.
			self.phase = EditPhase::Idle;
			self.pending_remote = None;
		}

		match self.phase {
			EditPhase::Idle => {
				self.begin_apply(content);
				ApplyDecision::Applied
			}
			EditPhase::LocalEditing { .. } | EditPhase::ApplyingRemote => {
				let replaced = self.pending_remote.replace(content.to_owned()).is_some();
				debug!(phase = ?self.phase, replaced, "edit.remote.deferred");
				ApplyDecision::Deferred
			}
		}
	}

	/// Ends a typing burst once its deadline has passed.
	///
	/// Returns the pending snapshot, if any, after entering
	/// [`EditPhase::ApplyingRemote`] for it.
	pub fn on_settle(&mut self, now: Instant) -> Option<String> {
		let EditPhase::LocalEditing { settle_at } = self.phase else {
			return None;
		};
		if now < settle_at {
			return None;
		}
		debug!("edit.typing.settled");
		self.phase = EditPhase::Idle;
		self.take_pending()
	}

	/// Enters [`EditPhase::ApplyingRemote`] with `content` as the known content.
	pub fn begin_apply(&mut self, content: &str) {
		debug!(bytes = content.len(), "edit.apply.begin");
		self.phase = EditPhase::ApplyingRemote;
		self.unechoed += 1;
		self.last_known.clear();
		self.last_known.push_str(content);
	}

	/// Leaves [`EditPhase::ApplyingRemote`], keeping the replace echo guard open
	/// for reports that have not arrived yet.
	///
	/// If the user typed during the apply, the typing burst resumes and any
	/// deferred snapshot keeps waiting for it to settle. Otherwise returns the
	/// snapshot deferred during the apply, if any, after entering
	/// [`EditPhase::ApplyingRemote`] again for it.
	pub fn finish_apply(&mut self, now: Instant) -> Option<String> {
		if self.phase != EditPhase::ApplyingRemote {
			return None;
		}
		debug!(unechoed = self.unechoed, "edit.apply.finish");
		self.replace_echo_until = (self.unechoed > 0).then(|| now + self.echo_window);
		if let Some(settle_at) = self.typed_while_applying.take() {
			self.phase = EditPhase::LocalEditing { settle_at };
			return None;
		}
		self.phase = EditPhase::Idle;
		self.take_pending()
	}

	/// Returns to [`EditPhase::Idle`], dropping the pending slot and both guards.
	pub fn reset(&mut self) {
		self.phase = EditPhase::Idle;
		self.pending_remote = None;
		self.local_echo.clear();
		self.replace_echo_until = None;
		self.unechoed = 0;
		self.typed_while_applying = None;
	}

	/// Consumes one expected replace report if the guard is open.
	fn take_replace_echo(&mut self, now: Instant) -> bool {
		let applying = self.phase == EditPhase::ApplyingRemote;
		let window = self.replace_echo_until.is_some_and(|until| now < until);
		if self.unechoed == 0 || (!applying && !window) {
			self.replace_echo_until = None;
			self.unechoed = 0;
			return false;
		}
		self.unechoed -= 1;
		if self.unechoed == 0 {
			self.replace_echo_until = None;
		}
		true
	}

	fn take_pending(&mut self) -> Option<String> {
		let next = self.pending_remote.take()?;
		if next == self.last_known {
			return None;
		}
		self.begin_apply(&next);
		Some(next)
	}
}

#[cfg(test)]
mod tests;
