//! Per-session driver.
//!
//! One task per mounted surface owns the [`EditCoordinator`] and reacts to:
//! - inbound bridge messages (responses are routed to their callers, events
//!   drive the coordinator),
//! - host requests queued by [`SessionHandle`],
//! - the typing settle deadline,
//! - reconcile and handshake completions.
//!
//! Reconciles run as separate tasks so the loop keeps dispatching the responses
//! they wait for. The coordinator enters [`crate::EditPhase::ApplyingRemote`]
//! before a reconcile is spawned and leaves it when its completion is polled,
//! which keeps at most one reconcile in flight.

mod events;
mod handle;

use std::sync::Arc;

use scribe_protocol::{Command, SurfaceEvent};
use scribe_rpc::{CommandSink, Correlator, Dispatch, Envelope, RequestIdGen};
use scribe_worker::{ShutdownToken, TaskClass, WorkerJoinSet, join_error_panic_message};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

pub use self::events::{NoOpEventHandler, SessionEventHandler, SharedEventHandler};
pub use self::handle::SessionHandle;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::selection::SelectionSerializer;
use crate::state::{ApplyDecision, EditCoordinator, EditPhase, LocalChange};
use crate::{BridgeStatus, EditorOptions, Result, SessionConfig, handshake};

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Whether the surface reported focus.
	pub focused: bool,
	/// Content most recently reported by the surface or handed to it.
	pub last_known_content: String,
	/// Last caret offset reported by the surface.
	pub last_cursor_position: usize,
	/// Current edit phase.
	pub phase: EditPhase,
	/// Snapshot queued behind typing or an in-flight replace.
	pub pending_remote: Option<String>,
	/// Outcome of the start-of-session probe.
	pub bridge: BridgeStatus,
	/// Bridge requests awaiting a response.
	pub pending_requests: usize,
}

pub(crate) enum HostCommand {
	SetContent {
		html: String,
		reply: oneshot::Sender<ApplyDecision>,
	},
	Snapshot {
		reply: oneshot::Sender<SessionSnapshot>,
	},
}

struct Session {
	coordinator: EditCoordinator,
	correlator: Arc<Correlator>,
	reconciler: Arc<Reconciler>,
	handler: SharedEventHandler,
	focus: watch::Sender<bool>,
	status: watch::Sender<BridgeStatus>,
	cursor: usize,
	reconciles: WorkerJoinSet<ReconcileOutcome>,
	probes: WorkerJoinSet<BridgeStatus>,
}

/// Mounts a surface and starts its session task.
///
/// `sink` carries commands to the embedded surface, `inbound` carries its raw
/// messages back. The `init` command is injected before this returns and
/// [`SessionEventHandler::on_editor_ready`] has been called.
///
/// The session stops on [`SessionHandle::shutdown`], when every handle is
/// dropped, or when `inbound` closes.
///
/// # Errors
///
/// - [`crate::Error::InvalidConfig`] if `config` fails validation.
/// - [`crate::Error::Bridge`] if the `init` command cannot be injected.
pub fn spawn_session(
	options: EditorOptions,
	config: SessionConfig,
	handler: SharedEventHandler,
	sink: Arc<dyn CommandSink>,
	inbound: mpsc::UnboundedReceiver<String>,
) -> Result<SessionHandle> {
	config.validate()?;

	let ids = RequestIdGen::random();
	debug!(session = ids.prefix(), "session.spawn");
	let correlator = Arc::new(Correlator::new(sink, ids));
	let init = Command::Init {
		content: options.initial_content.clone(),
		editable: options.editable,
		placeholder: options.placeholder,
	};
	correlator.inject(init.encode()?)?;

	let (focus_tx, focus_rx) = watch::channel(false);
	let (status_tx, status_rx) = watch::channel(BridgeStatus::Pending);
	let (commands_tx, commands_rx) = mpsc::unbounded_channel();
	let shutdown = ShutdownToken::new();

	let selection = Arc::new(SelectionSerializer::new(
		correlator.clone(),
		focus_rx.clone(),
		config.selection_timeout(),
	));
	let reconciler = Arc::new(Reconciler::new(
		correlator.clone(),
		selection,
		focus_rx,
		config.remote_settle(),
	));

	let mut session = Session {
		coordinator: EditCoordinator::new(options.initial_content, &config),
		correlator: correlator.clone(),
		reconciler,
		handler: handler.clone(),
		focus: focus_tx,
		status: status_tx,
		cursor: 0,
		reconciles: WorkerJoinSet::new(TaskClass::Interactive),
		probes: WorkerJoinSet::new(TaskClass::Background),
	};

	let probe_correlator = correlator.clone();
	let handshake_timeout = config.handshake_timeout();
	session
		.probes
		.spawn(async move { handshake::probe(&probe_correlator, handshake_timeout).await });

	let handle = SessionHandle {
		commands: commands_tx,
		correlator,
		status: status_rx,
		shutdown: shutdown.clone(),
		content_timeout: config.content_timeout(),
	};

	scribe_worker::spawn(TaskClass::Interactive, session.run(commands_rx, inbound, shutdown));
	handler.on_editor_ready(handle.clone());
	Ok(handle)
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => tokio::time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}

impl Session {
	async fn run(
		mut self,
		mut commands: mpsc::UnboundedReceiver<HostCommand>,
		mut inbound: mpsc::UnboundedReceiver<String>,
		shutdown: ShutdownToken,
	) {
		loop {
			let settle = self.coordinator.settle_deadline();
			tokio::select! {
				biased;

				_ = shutdown.cancelled() => {
					debug!("session.shutdown");
					break;
				}
				msg = inbound.recv() => match msg {
					Some(raw) => self.on_inbound(&raw),
					None => {
						debug!("session.bridge_closed");
						break;
					}
				},
				cmd = commands.recv() => match cmd {
					Some(cmd) => self.on_host_command(cmd),
					None => {
						debug!("session.handles_dropped");
						break;
					}
				},
				Some(done) = self.reconciles.join_next() => self.on_reconciled(done),
				Some(done) = self.probes.join_next() => self.on_probe(done),
				_ = sleep_until_deadline(settle) => self.on_settle(),
			}
		}
		self.teardown();
	}

	fn on_inbound(&mut self, raw: &str) {
		let envelope = match Envelope::decode(raw) {
			Ok(envelope) => envelope,
			Err(err) => {
				debug!(error = %err, "session.inbound.malformed");
				return;
			}
		};
		let Dispatch::Event(envelope) = self.correlator.dispatch(envelope) else {
			return;
		};
		match SurfaceEvent::from_envelope(&envelope) {
			Some(Ok(event)) => self.on_event(event),
			Some(Err(err)) => debug!(kind = %envelope.kind, error = %err, "session.event.malformed"),
			None => debug!(kind = %envelope.kind, "session.event.unknown"),
		}
	}

	fn on_event(&mut self, event: SurfaceEvent) {
		match event {
			SurfaceEvent::ContentChange { html } => {
				match self.coordinator.notify_local_change(&html, Instant::now()) {
					LocalChange::Accepted => self.handler.on_content_change(&html),
					LocalChange::Absorbed | LocalChange::Ignored => {}
				}
			}
			SurfaceEvent::CursorPosition { position } => {
				self.cursor = position;
				self.handler.on_cursor_position(position);
			}
			SurfaceEvent::Focus => {
				trace!("session.focus");
				self.focus.send_replace(true);
			}
			SurfaceEvent::Blur => {
				trace!("session.blur");
				self.focus.send_replace(false);
			}
		}
	}

	fn on_host_command(&mut self, cmd: HostCommand) {
		match cmd {
			HostCommand::SetContent { html, reply } => {
				let decision = self.coordinator.request_apply_remote(&html, Instant::now());
				if decision == ApplyDecision::Applied {
					self.start_reconcile(html);
				}
				let _ = reply.send(decision);
			}
			HostCommand::Snapshot { reply } => {
				let _ = reply.send(self.snapshot());
			}
		}
	}

	fn on_settle(&mut self) {
		if let Some(next) = self.coordinator.on_settle(Instant::now()) {
			self.start_reconcile(next);
		}
	}

	fn start_reconcile(&mut self, content: String) {
		debug!(bytes = content.len(), focused = *self.focus.borrow(), "session.apply.start");
		let reconciler = self.reconciler.clone();
		self.reconciles.spawn(async move { reconciler.apply(content).await });
	}

	fn on_reconciled(&mut self, done: Result<ReconcileOutcome, JoinError>) {
		match done {
			Ok(outcome) => debug!(?outcome, "session.apply.done"),
			Err(err) => match join_error_panic_message(err) {
				Some(panic) => warn!(%panic, "session.apply.panicked"),
				None => debug!("session.apply.aborted"),
			},
		}
		if let Some(next) = self.coordinator.finish_apply(Instant::now()) {
			self.start_reconcile(next);
		}
	}

	fn on_probe(&mut self, done: Result<BridgeStatus, JoinError>) {
		let status = done.unwrap_or(BridgeStatus::Unverified);
		self.status.send_replace(status);
		self.handler.on_bridge_status(status);
	}

	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			focused: *self.focus.borrow(),
			last_known_content: self.coordinator.last_known().to_owned(),
			last_cursor_position: self.cursor,
			phase: self.coordinator.phase(),
			pending_remote: self.coordinator.pending_remote().map(str::to_owned),
			bridge: *self.status.borrow(),
			pending_requests: self.correlator.pending_len(),
		}
	}

	fn teardown(&mut self) {
		let cancelled = self.correlator.cancel_all();
		self.reconciles.abort_all();
		self.probes.abort_all();
		self.coordinator.reset();
		debug!(cancelled, "session.teardown");
	}
}
