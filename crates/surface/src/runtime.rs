//! Independent event loop hosting a [`Surface`].

use std::time::Duration;

use scribe_protocol::{Command, SerializedSelection};
use scribe_worker::TaskClass;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::surface::Surface;
use crate::{Error, Result};

/// Behaviour knobs for a spawned surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceOptions {
	/// When false, the surface still executes every command but never posts a
	/// response envelope, like an embedded context whose script hung.
	pub respond: bool,
	/// Delay applied before each response. Delays are served in order, so
	/// later commands wait behind earlier responses.
	pub latency: Duration,
}

impl Default for SurfaceOptions {
	fn default() -> Self {
		Self {
			respond: true,
			latency: Duration::ZERO,
		}
	}
}

/// Host-side ends of the bridge to a spawned surface.
#[derive(Debug)]
pub struct BridgeEnds {
	/// Outbound command channel; usable directly as a `CommandSink`.
	pub commands: mpsc::UnboundedSender<String>,
	/// Raw inbound messages posted by the surface.
	pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Observable surface state, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
	/// Current markup.
	pub html: String,
	/// Structural address of the live selection, if focused and selected.
	pub selection: Option<SerializedSelection>,
	/// Whether the editable root has focus.
	pub focused: bool,
	/// Placeholder configured by the host.
	pub placeholder: String,
	/// Content replaces executed.
	pub replaces: usize,
	/// Successful selection restores.
	pub restores: usize,
	/// Scroll-into-view requests.
	pub scrolls: usize,
	/// Commands received, malformed ones included.
	pub commands: usize,
}

enum Control {
	Type(String),
	Focus,
	Blur,
	Select(SerializedSelection, oneshot::Sender<bool>),
	Snapshot(oneshot::Sender<SurfaceSnapshot>),
	Respond(bool),
	PostRaw(String),
}

/// Drives simulated user input into a spawned surface.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
	control: mpsc::UnboundedSender<Control>,
}

impl SurfaceHandle {
	fn send(&self, control: Control) -> Result<()> {
		self.control.send(control).map_err(|_| Error::Stopped)
	}

	/// Types `text` at the caret.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub fn type_text(&self, text: impl Into<String>) -> Result<()> {
		self.send(Control::Type(text.into()))
	}

	/// Moves focus into the editable root.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub fn focus(&self) -> Result<()> {
		self.send(Control::Focus)
	}

	/// Moves focus out of the editable root.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub fn blur(&self) -> Result<()> {
		self.send(Control::Blur)
	}

	/// Selects a range by path, as a user drag would.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub async fn select(&self, selection: SerializedSelection) -> Result<bool> {
		let (tx, rx) = oneshot::channel();
		self.send(Control::Select(selection, tx))?;
		rx.await.map_err(|_| Error::Stopped)
	}

	/// Reads the surface state after every previously queued input was applied.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub async fn snapshot(&self) -> Result<SurfaceSnapshot> {
		let (tx, rx) = oneshot::channel();
		self.send(Control::Snapshot(tx))?;
		rx.await.map_err(|_| Error::Stopped)
	}

	/// Toggles whether response envelopes are posted.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub fn set_responding(&self, respond: bool) -> Result<()> {
		self.send(Control::Respond(respond))
	}

	/// Posts arbitrary text on the inbound channel.
	///
	/// # Errors
	///
	/// Returns [`Error::Stopped`] if the surface loop has exited.
	pub fn post_raw(&self, raw: impl Into<String>) -> Result<()> {
		self.send(Control::PostRaw(raw.into()))
	}
}

/// Spawns a surface loop on the current runtime.
///
/// The loop exits when the host drops its command sender or its inbound receiver.
pub fn spawn_surface(options: SurfaceOptions) -> (SurfaceHandle, BridgeEnds) {
	let (commands_tx, commands_rx) = mpsc::unbounded_channel();
	let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
	let (control_tx, control_rx) = mpsc::unbounded_channel();

	scribe_worker::spawn(
		TaskClass::Interactive,
		run(Surface::new(), options, commands_rx, inbound_tx, control_rx),
	);

	(
		SurfaceHandle { control: control_tx },
		BridgeEnds {
			commands: commands_tx,
			inbound: inbound_rx,
		},
	)
}

async fn run(
	mut surface: Surface,
	mut options: SurfaceOptions,
	mut commands: mpsc::UnboundedReceiver<String>,
	inbound: mpsc::UnboundedSender<String>,
	mut control: mpsc::UnboundedReceiver<Control>,
) {
	let mut control_open = true;
	let mut seen = 0usize;

	loop {
		let out = tokio::select! {
			biased;

			cmd = commands.recv() => match cmd {
				Some(text) => {
					seen += 1;
					match Command::decode(&text) {
						Ok(command) => surface.handle(command),
						Err(err) => {
							warn!(error = %err, "surface.command.malformed");
							continue;
						}
					}
				}
				None => break,
			},

			ctl = control.recv(), if control_open => match ctl {
				Some(Control::Type(text)) => surface.type_text(&text),
				Some(Control::Focus) => surface.focus(),
				Some(Control::Blur) => surface.blur(),
				Some(Control::Select(selection, tx)) => {
					let _ = tx.send(surface.restore_selection(&selection));
					continue;
				}
				Some(Control::Snapshot(tx)) => {
					let _ = tx.send(snapshot(&surface, seen));
					continue;
				}
				Some(Control::Respond(respond)) => {
					options.respond = respond;
					continue;
				}
				Some(Control::PostRaw(raw)) => {
					if inbound.send(raw).is_err() {
						break;
					}
					continue;
				}
				None => {
					control_open = false;
					continue;
				}
			},
		};

		for envelope in out {
			if envelope.request_id.is_some() {
				if !options.respond {
					trace!(kind = %envelope.kind, "surface.response.withheld");
					continue;
				}
				if !options.latency.is_zero() {
					tokio::time::sleep(options.latency).await;
				}
			}
			let raw = match envelope.encode() {
				Ok(raw) => raw,
				Err(err) => {
					warn!(error = %err, "surface.envelope.encode_failed");
					continue;
				}
			};
			if inbound.send(raw).is_err() {
				debug!("surface.host_gone");
				return;
			}
		}
	}
	debug!(commands = seen, "surface.stopped");
}

fn snapshot(surface: &Surface, commands: usize) -> SurfaceSnapshot {
	let stats = surface.stats();
	SurfaceSnapshot {
		html: surface.html(),
		selection: surface.serialize_selection(),
		focused: surface.is_focused(),
		placeholder: surface.placeholder().to_owned(),
		replaces: stats.replaces,
		restores: stats.restores,
		scrolls: stats.scrolls,
		commands,
	}
}
