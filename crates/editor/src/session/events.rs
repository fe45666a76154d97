use std::sync::Arc;

use super::SessionHandle;
use crate::BridgeStatus;

/// Callbacks from an editing session to the hosting screen.
///
/// All methods default to no-ops and run on the session task, so they must not
/// block. To react with a handle call, spawn.
pub trait SessionEventHandler: Send + Sync + 'static {
	/// The surface was mounted with the initial content.
	fn on_editor_ready(&self, _handle: SessionHandle) {}

	/// The user changed the document. Never called for remote replaces.
	fn on_content_change(&self, _html: &str) {}

	/// The caret moved.
	fn on_cursor_position(&self, _position: usize) {}

	/// The start-of-session probe resolved.
	fn on_bridge_status(&self, _status: BridgeStatus) {}
}

/// A no-op event handler for sessions whose host only polls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventHandler;

impl SessionEventHandler for NoOpEventHandler {}

/// Type alias for a shared event handler.
pub type SharedEventHandler = Arc<dyn SessionEventHandler>;
