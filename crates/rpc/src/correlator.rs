//! Pending-request table matching inbound responses to outbound commands.
//!
//! The bridge has no synchronous call/return. [`Correlator::request`] embeds a
//! fresh [`RequestId`] in the command text, parks a resolver in the table and
//! injects the command; [`Correlator::dispatch`] routes each inbound envelope
//! back to its resolver by id, so responses may arrive in any order.
//!
//! Every request resolves exactly once:
//! - a matching response removes the entry and resolves it,
//! - the deadline removes the entry and resolves with [`Error::Timeout`],
//! - [`Correlator::cancel_all`] drops the entry and resolves with [`Error::Cancelled`].
//!
//! A response arriving after its entry is gone is discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{CommandSink, Envelope, Error, RequestId, RequestIdGen, Result};

/// A request awaiting its response. The caller owns the deadline.
#[derive(Debug)]
struct PendingRequest {
	/// Response type the embedded context must answer with.
	expects: &'static str,
	resolver: oneshot::Sender<Envelope>,
}

/// Outcome of routing one inbound envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
	/// The envelope answered a pending request.
	Resolved,
	/// The envelope carried a request id that matches nothing pending.
	Unmatched(Envelope),
	/// The envelope is a spontaneous event for the caller to route.
	Event(Envelope),
}

/// Per-session request/response correlator.
pub struct Correlator {
	sink: Arc<dyn CommandSink>,
	ids: Mutex<RequestIdGen>,
	pending: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl std::fmt::Debug for Correlator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Correlator")
			.field("pending", &self.pending.lock().len())
			.finish_non_exhaustive()
	}
}

impl Correlator {
	/// Creates a correlator injecting commands into `sink`.
	pub fn new(sink: Arc<dyn CommandSink>, ids: RequestIdGen) -> Self {
		Self {
			sink,
			ids: Mutex::new(ids),
			pending: Mutex::new(HashMap::new()),
		}
	}

	/// Injects a command that expects no response.
	///
	/// # Errors
	///
	/// Returns [`Error::ChannelClosed`] once the embedded context is gone.
	pub fn inject(&self, command: String) -> Result<()> {
		self.sink.inject(command)
	}

	/// Issues a command and waits for the response of type `expects`.
	///
	/// `build` receives the generated id and returns the command text, which
	/// must embed that id literally for the embedded side to echo it back.
	/// Dropping the returned future abandons the request and frees its entry.
	///
	/// # Errors
	///
	/// - [`Error::Timeout`] if nothing matched before `timeout` elapsed.
	/// - [`Error::Cancelled`] if the table was torn down first.
	/// - [`Error::ChannelClosed`] if the command could not be injected.
	/// - Any error returned by `build`.
	pub async fn request<F>(&self, expects: &'static str, timeout: Duration, build: F) -> Result<Envelope>
	where
		F: FnOnce(&RequestId) -> Result<String>,
	{
		let id = self.ids.lock().next();
		let command = build(&id)?;
		let deadline = Instant::now() + timeout;
		let (tx, rx) = oneshot::channel();

		self.pending.lock().insert(
			id.clone(),
			PendingRequest {
				expects,
				resolver: tx,
			},
		);
		let mut guard = EntryGuard {
			pending: &self.pending,
			id: Some(id.clone()),
		};

		self.sink.inject(command)?;
		trace!(request_id = %id, expects, ?timeout, "bridge.request.issued");

		match tokio::time::timeout_at(deadline, rx).await {
			Ok(Ok(envelope)) => {
				guard.disarm();
				Ok(envelope)
			}
			Ok(Err(_)) => {
				debug!(request_id = %id, "bridge.request.cancelled");
				Err(Error::Cancelled(id))
			}
			Err(_) => {
				debug!(request_id = %id, expects, "bridge.request.timeout");
				Err(Error::Timeout(id))
			}
		}
	}

	/// Routes one inbound envelope.
	///
	/// Envelopes without a request id are handed back as [`Dispatch::Event`].
	/// A response resolves its entry only when both the id and the expected type
	/// match; anything else is reported as [`Dispatch::Unmatched`] and has no
	/// effect on the table.
	pub fn dispatch(&self, envelope: Envelope) -> Dispatch {
		let Some(id) = envelope.request_id.clone() else {
			return Dispatch::Event(envelope);
		};

		let mut pending = self.pending.lock();
		let entry = match pending.remove(&id) {
			Some(entry) if entry.expects == envelope.kind => entry,
			Some(entry) => {
				pending.insert(id.clone(), entry);
				drop(pending);
				debug!(request_id = %id, kind = %envelope.kind, "bridge.response.kind_mismatch");
				return Dispatch::Unmatched(envelope);
			}
			None => {
				drop(pending);
				debug!(request_id = %id, kind = %envelope.kind, "bridge.response.unmatched");
				return Dispatch::Unmatched(envelope);
			}
		};
		drop(pending);

		// The caller may have stopped waiting in the meantime.
		let _ = entry.resolver.send(envelope);
		trace!(request_id = %id, "bridge.response.resolved");
		Dispatch::Resolved
	}

	/// Drops every pending entry; their callers observe [`Error::Cancelled`].
	///
	/// Returns the number of entries cleared.
	pub fn cancel_all(&self) -> usize {
		let drained: Vec<_> = self.pending.lock().drain().collect();
		if !drained.is_empty() {
			debug!(count = drained.len(), "bridge.request.cancel_all");
		}
		drained.len()
	}

	/// Number of requests currently awaiting a response.
	pub fn pending_len(&self) -> usize {
		self.pending.lock().len()
	}
}

/// Removes a request's table entry unless the request resolved normally.
struct EntryGuard<'a> {
	pending: &'a Mutex<HashMap<RequestId, PendingRequest>>,
	id: Option<RequestId>,
}

impl EntryGuard<'_> {
	fn disarm(&mut self) {
		self.id = None;
	}
}

impl Drop for EntryGuard<'_> {
	fn drop(&mut self) {
		if let Some(id) = self.id.take() {
			self.pending.lock().remove(&id);
		}
	}
}
