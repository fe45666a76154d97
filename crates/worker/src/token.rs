use tokio_util::sync::CancellationToken;

/// Cancellation token shared by a session task and every handle to it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
	cancel: CancellationToken,
}

impl ShutdownToken {
	/// Creates a fresh, uncancelled token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests shutdown.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when shutdown is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}
