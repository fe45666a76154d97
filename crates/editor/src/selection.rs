//! Structural selection capture and restore over the bridge.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scribe_protocol::{Command, SelectionRestoredResponse, SelectionSerializedResponse, SerializedSelection, kind};
use scribe_rpc::{Correlator, Error as RpcError};
use tokio::sync::watch;
use tracing::debug;

/// Captures the live selection as child-index paths and restores it later.
///
/// Paths survive a full content replace, node references do not. They are
/// best effort: a structural edit between capture and restore makes them
/// point somewhere else, or nowhere.
#[derive(Debug)]
pub struct SelectionSerializer {
	correlator: Arc<Correlator>,
	focus: watch::Receiver<bool>,
	timeout: Duration,
	last: Mutex<Option<SerializedSelection>>,
}

impl SelectionSerializer {
	pub fn new(correlator: Arc<Correlator>, focus: watch::Receiver<bool>, timeout: Duration) -> Self {
		Self {
			correlator,
			focus,
			timeout,
			last: Mutex::new(None),
		}
	}

	/// The most recent selection the surface reported.
	pub fn last_captured(&self) -> Option<SerializedSelection> {
		self.last.lock().clone()
	}

	/// Asks the surface for its selection.
	///
	/// `None` when unfocused or nothing is selected. If the surface does not
	/// answer, falls back to the last captured selection.
	pub async fn serialize(&self) -> Option<SerializedSelection> {
		if !*self.focus.borrow() {
			return None;
		}

		let reply = self
			.correlator
			.request(kind::SELECTION_SERIALIZED, self.timeout, |id| {
				Command::SerializeSelection { request_id: id.clone() }.encode()
			})
			.await
			.and_then(|envelope| envelope.payload_as::<SelectionSerializedResponse>());

		match reply {
			Ok(SelectionSerializedResponse { selection: Some(selection) }) => {
				*self.last.lock() = Some(selection.clone());
				Some(selection)
			}
			Ok(SelectionSerializedResponse { selection: None }) => None,
			Err(err) => {
				let fallback = self.last_captured();
				debug!(error = %err, fallback = fallback.is_some(), "selection.serialize.failed");
				fallback
			}
		}
	}

	/// Asks the surface to walk both paths, clamp the offsets, select the range
	/// and scroll it into view.
	///
	/// Returns false if a path no longer resolves or the surface did not answer.
	pub async fn deserialize(&self, selection: &SerializedSelection) -> bool {
		let reply = self
			.correlator
			.request(kind::SELECTION_RESTORED, self.timeout, |id| {
				Command::RestoreSelection {
					request_id: id.clone(),
					selection: selection.clone(),
				}
				.encode()
			})
			.await
			.and_then(|envelope| envelope.payload_as::<SelectionRestoredResponse>());

		match reply {
			Ok(SelectionRestoredResponse { restored }) => restored,
			Err(RpcError::Timeout(id)) => {
				debug!(request_id = %id, "selection.restore.timeout");
				false
			}
			Err(err) => {
				debug!(error = %err, "selection.restore.failed");
				false
			}
		}
	}
}
