//! Public handle to an editing session.

use std::sync::Arc;
use std::time::Duration;

use scribe_protocol::{Command, ContentHtmlResponse, kind};
use scribe_rpc::Correlator;
use scribe_worker::ShutdownToken;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::{HostCommand, SessionSnapshot};
use crate::text::TextExtractor;
use crate::{ApplyDecision, BridgeStatus, Error, Result};

/// Handle given to the hosting screen.
///
/// Edit state lives in the session task; this handle only queues requests to
/// it, or talks to the surface directly for reads the session does not gate.
/// Once the session stops every call fails with [`Error::SessionClosed`].
#[derive(Clone)]
pub struct SessionHandle {
	pub(super) commands: mpsc::UnboundedSender<HostCommand>,
	pub(super) correlator: Arc<Correlator>,
	pub(super) status: watch::Receiver<BridgeStatus>,
	pub(super) shutdown: ShutdownToken,
	pub(super) content_timeout: Duration,
}

impl std::fmt::Debug for SessionHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionHandle")
			.field("closed", &self.commands.is_closed())
			.field("bridge", &*self.status.borrow())
			.finish_non_exhaustive()
	}
}

impl SessionHandle {
	/// Returns true once the session task has stopped.
	pub fn is_closed(&self) -> bool {
		self.commands.is_closed()
	}

	fn ensure_open(&self) -> Result<()> {
		if self.is_closed() {
			return Err(Error::SessionClosed);
		}
		Ok(())
	}

	async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> HostCommand) -> Result<T> {
		let (tx, rx) = oneshot::channel();
		self.commands.send(build(tx)).map_err(|_| Error::SessionClosed)?;
		rx.await.map_err(|_| Error::SessionClosed)
	}

	fn inject(&self, command: Command) -> Result<()> {
		self.ensure_open()?;
		self.correlator.inject(command.encode()?)?;
		Ok(())
	}

	/// Current markup as the surface holds it.
	///
	/// Falls back to the last known content if the surface does not answer
	/// within the content timeout.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] once the session has stopped.
	pub async fn get_content_html(&self) -> Result<String> {
		self.ensure_open()?;
		let reply = self
			.correlator
			.request(kind::CONTENT_HTML, self.content_timeout, |id| {
				Command::GetContent { request_id: id.clone() }.encode()
			})
			.await
			.and_then(|envelope| envelope.payload_as::<ContentHtmlResponse>());

		match reply {
			Ok(ContentHtmlResponse { html }) => Ok(html),
			Err(err) => {
				debug!(error = %err, "session.get_content.fallback");
				Ok(self.snapshot().await?.last_known_content)
			}
		}
	}

	/// Requests that `html` replace the document.
	///
	/// Applied immediately when idle; deferred while the user types or another
	/// replace is in flight; a no-op when it equals the current content.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] once the session has stopped.
	pub async fn set_content_html(&self, html: impl Into<String>) -> Result<ApplyDecision> {
		let html = html.into();
		self.call(|reply| HostCommand::SetContent { html, reply }).await
	}

	/// Current document as plain text, converted by `extractor`.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] once the session has stopped.
	pub async fn get_plain_text(&self, extractor: &impl TextExtractor) -> Result<String> {
		let html = self.get_content_html().await?;
		Ok(extractor.extract(&html))
	}

	/// Moves focus into the editable root.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] or [`Error::Bridge`].
	pub fn focus_editor(&self) -> Result<()> {
		self.inject(Command::Focus)
	}

	/// Moves focus out of the editable root.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] or [`Error::Bridge`].
	pub fn blur_editor(&self) -> Result<()> {
		self.inject(Command::Blur)
	}

	/// Last caret offset the surface reported.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] once the session has stopped.
	pub async fn get_cursor_position(&self) -> Result<usize> {
		Ok(self.snapshot().await?.last_cursor_position)
	}

	/// Places the caret at a character offset in the document text.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] or [`Error::Bridge`].
	pub fn set_cursor_position(&self, position: usize) -> Result<()> {
		self.inject(Command::SetCursor { position })
	}

	/// Outcome of the start-of-session probe.
	pub fn bridge_status(&self) -> BridgeStatus {
		*self.status.borrow()
	}

	/// Session state as of the moment the request is processed.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] once the session has stopped.
	pub async fn snapshot(&self) -> Result<SessionSnapshot> {
		self.call(|reply| HostCommand::Snapshot { reply }).await
	}

	/// Stops the session and waits for its teardown.
	///
	/// Outstanding bridge requests resolve as cancelled. Idempotent.
	pub async fn shutdown(&self) {
		self.shutdown.cancel();
		self.commands.closed().await;
	}
}
