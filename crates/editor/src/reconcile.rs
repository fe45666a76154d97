//! Content replace that keeps the user's cursor where it was.

use std::sync::Arc;
use std::time::Duration;

use scribe_protocol::Command;
use scribe_rpc::Correlator;
use tokio::sync::watch;
use tracing::debug;

use crate::selection::SelectionSerializer;

/// Result of one reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
	/// Replaced while unfocused; selection was never involved.
	Replaced,
	/// Replaced and the captured selection restored.
	Restored,
	/// Replaced, but there was no selection to restore, focus left during the
	/// settle pause, or the restore failed.
	SelectionDropped,
	/// The bridge is gone; nothing was replaced.
	Disconnected,
}

/// Orchestrates capture selection, replace content, restore selection.
///
/// Callers enter [`crate::EditPhase::ApplyingRemote`] before starting
/// [`Reconciler::apply`] and leave it once the returned future completes, so at
/// most one reconcile runs per session.
#[derive(Debug)]
pub struct Reconciler {
	correlator: Arc<Correlator>,
	selection: Arc<SelectionSerializer>,
	focus: watch::Receiver<bool>,
	remote_settle: Duration,
}

impl Reconciler {
	pub fn new(
		correlator: Arc<Correlator>,
		selection: Arc<SelectionSerializer>,
		focus: watch::Receiver<bool>,
		remote_settle: Duration,
	) -> Self {
		Self {
			correlator,
			selection,
			focus,
			remote_settle,
		}
	}

	fn is_focused(&self) -> bool {
		*self.focus.borrow()
	}

	fn replace(&self, content: String) -> bool {
		let command = match (Command::SetContent { html: content }).encode() {
			Ok(command) => command,
			Err(err) => {
				debug!(error = %err, "reconcile.encode_failed");
				return false;
			}
		};
		match self.correlator.inject(command) {
			Ok(()) => true,
			Err(err) => {
				debug!(error = %err, "reconcile.replace_failed");
				false
			}
		}
	}

	/// Swaps `content` into the surface.
	pub async fn apply(&self, content: String) -> ReconcileOutcome {
		if !self.is_focused() {
			return if self.replace(content) {
				debug!(focused = false, "reconcile.replaced");
				ReconcileOutcome::Replaced
			} else {
				ReconcileOutcome::Disconnected
			};
		}

		let captured = self.selection.serialize().await;
		if !self.replace(content) {
			return ReconcileOutcome::Disconnected;
		}

		tokio::time::sleep(self.remote_settle).await;

		let Some(selection) = captured.filter(|_| self.is_focused()) else {
			debug!("reconcile.selection.skipped");
			return ReconcileOutcome::SelectionDropped;
		};
		if self.selection.deserialize(&selection).await {
			debug!("reconcile.selection.restored");
			ReconcileOutcome::Restored
		} else {
			debug!("reconcile.selection.dropped");
			ReconcileOutcome::SelectionDropped
		}
	}
}
