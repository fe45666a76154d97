//! Outbound half of the bridge channel.

use tokio::sync::mpsc;

use crate::{Error, Result};

/// One-way command injection into the embedded context.
///
/// Injection never waits for the embedded side; anything it has to say comes
/// back later on the inbound channel. Commands are delivered in injection order.
pub trait CommandSink: Send + Sync + 'static {
	/// Queues `command` for delivery.
	///
	/// # Errors
	///
	/// Returns [`Error::ChannelClosed`] once the embedded context is gone.
	fn inject(&self, command: String) -> Result<()>;
}

impl CommandSink for mpsc::UnboundedSender<String> {
	fn inject(&self, command: String) -> Result<()> {
		self.send(command).map_err(|_| Error::ChannelClosed)
	}
}
