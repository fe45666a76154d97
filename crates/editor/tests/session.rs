//! End-to-end sessions against the reference surface.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use scribe_editor::{
	ApplyDecision, BridgeStatus, EditPhase, EditorOptions, SelectionSerializer, SessionConfig, SessionEventHandler,
	SessionHandle, spawn_session,
};
use scribe_protocol::SerializedSelection;
use scribe_rpc::{Correlator, Dispatch, Envelope, RequestIdGen};
use scribe_surface::{SurfaceHandle, SurfaceOptions, spawn_surface};
use tokio::sync::watch;

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Default)]
struct Host {
	changes: Mutex<Vec<String>>,
	cursors: Mutex<Vec<usize>>,
}

impl SessionEventHandler for Host {
	fn on_content_change(&self, html: &str) {
		self.changes.lock().push(html.to_owned());
	}

	fn on_cursor_position(&self, position: usize) {
		self.cursors.lock().push(position);
	}
}

fn mount(content: &str, options: SurfaceOptions) -> (SessionHandle, SurfaceHandle, Arc<Host>) {
	init_tracing();
	let (surface, ends) = spawn_surface(options);
	let host = Arc::new(Host::default());
	let session = spawn_session(
		EditorOptions::new(content).with_placeholder("Answer"),
		SessionConfig::default(),
		host.clone(),
		Arc::new(ends.commands),
		ends.inbound,
	)
	.unwrap();
	(session, surface, host)
}

/// Lets every ready task run; the paused clock advances by a millisecond.
async fn quiesce() {
	tokio::time::sleep(ms(1)).await;
}

#[tokio::test(start_paused = true)]
async fn scenario_idle_apply_then_typing_precedence() {
	let (session, surface, host) = mount("Hello", SurfaceOptions::default());
	quiesce().await;
	assert_eq!(session.bridge_status(), BridgeStatus::Verified { version: 1 });

	assert_eq!(session.set_content_html("Hello").await.unwrap(), ApplyDecision::Unchanged);
	quiesce().await;
	assert_eq!(surface.snapshot().await.unwrap().replaces, 0);

	assert_eq!(session.set_content_html("Hello world").await.unwrap(), ApplyDecision::Applied);
	quiesce().await;
	assert_eq!(surface.snapshot().await.unwrap().html, "Hello world");
	assert_eq!(session.snapshot().await.unwrap().last_known_content, "Hello world");

	session.focus_editor().unwrap();
	quiesce().await;
	surface.type_text("Hi").unwrap();
	quiesce().await;
	assert_eq!(session.snapshot().await.unwrap().last_known_content, "HiHello world");

	assert_eq!(session.set_content_html("Bye").await.unwrap(), ApplyDecision::Deferred);
	tokio::time::sleep(ms(300)).await;
	assert_eq!(surface.snapshot().await.unwrap().html, "HiHello world");

	tokio::time::sleep(ms(200)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.html, "Bye");
	assert_eq!(after.replaces, 2);

	tokio::time::sleep(ms(200)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.replaces, 2);
	assert_eq!(after.restores, 1);
	assert_eq!(after.selection, Some(SerializedSelection::caret(vec![0], 2)));
	assert_eq!(*host.changes.lock(), vec!["HiHello world".to_owned()]);
	assert_eq!(session.snapshot().await.unwrap().phase, EditPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn remote_replace_never_reaches_the_host() {
	let (session, surface, host) = mount("<p>One</p>", SurfaceOptions::default());
	session.focus_editor().unwrap();
	quiesce().await;

	for html in ["<p>Two</p>", "<p>Three</p>", "<p>Four</p>"] {
		session.set_content_html(html).await.unwrap();
		tokio::time::sleep(ms(400)).await;
	}

	assert_eq!(surface.snapshot().await.unwrap().html, "<p>Four</p>");
	assert!(host.changes.lock().is_empty());
	assert_eq!(session.snapshot().await.unwrap().phase, EditPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn typing_during_apply_settle_is_reported_and_kept() {
	let (session, surface, host) = mount("Hello", SurfaceOptions::default());
	session.focus_editor().unwrap();
	quiesce().await;

	assert_eq!(session.set_content_html("Bye").await.unwrap(), ApplyDecision::Applied);
	tokio::time::sleep(ms(50)).await;
	surface.type_text("X").unwrap();
	quiesce().await;
	assert_eq!(surface.snapshot().await.unwrap().html, "XBye");
	assert_eq!(*host.changes.lock(), vec!["XBye".to_owned()]);

	assert_eq!(session.set_content_html("Remote").await.unwrap(), ApplyDecision::Deferred);
	tokio::time::sleep(ms(200)).await;
	assert_eq!(surface.snapshot().await.unwrap().html, "XBye");
	assert!(matches!(session.snapshot().await.unwrap().phase, EditPhase::LocalEditing { .. }));

	tokio::time::sleep(ms(600)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.html, "Remote");
	assert_eq!(after.replaces, 2);
	assert_eq!(*host.changes.lock(), vec!["XBye".to_owned()]);
	assert_eq!(session.snapshot().await.unwrap().phase, EditPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn requests_while_typing_keep_only_the_last() {
	let (session, surface, _host) = mount("", SurfaceOptions::default());
	session.focus_editor().unwrap();
	quiesce().await;
	surface.type_text("draft").unwrap();
	quiesce().await;

	assert_eq!(session.set_content_html("first").await.unwrap(), ApplyDecision::Deferred);
	assert_eq!(session.set_content_html("second").await.unwrap(), ApplyDecision::Deferred);
	assert_eq!(session.snapshot().await.unwrap().pending_remote.as_deref(), Some("second"));

	tokio::time::sleep(ms(800)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.html, "second");
	assert_eq!(after.replaces, 1);
}

#[tokio::test(start_paused = true)]
async fn host_echo_of_its_own_edit_is_ignored() {
	let (session, surface, host) = mount("", SurfaceOptions::default());
	session.focus_editor().unwrap();
	quiesce().await;
	surface.type_text("a").unwrap();
	quiesce().await;
	surface.type_text("b").unwrap();
	quiesce().await;
	assert_eq!(*host.changes.lock(), vec!["a".to_owned(), "ab".to_owned()]);

	assert_eq!(session.set_content_html("ab").await.unwrap(), ApplyDecision::Unchanged);
	assert_eq!(session.set_content_html("a").await.unwrap(), ApplyDecision::Suppressed);

	tokio::time::sleep(ms(600)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.html, "ab");
	assert_eq!(after.replaces, 0);
}

#[tokio::test(start_paused = true)]
async fn cursor_follows_the_surface() {
	let (session, surface, host) = mount("<p>Hello</p>", SurfaceOptions::default());
	session.focus_editor().unwrap();
	session.set_cursor_position(3).unwrap();
	quiesce().await;

	assert_eq!(session.get_cursor_position().await.unwrap(), 3);
	assert_eq!(*host.cursors.lock(), vec![3]);
	assert_eq!(
		surface.snapshot().await.unwrap().selection,
		Some(SerializedSelection::caret(vec![0, 0], 3))
	);

	session.blur_editor().unwrap();
	quiesce().await;
	assert!(!session.snapshot().await.unwrap().focused);
}

#[tokio::test(start_paused = true)]
async fn content_and_plain_text_come_from_the_surface() {
	let (session, surface, _host) = mount("<p>Hi</p>", SurfaceOptions::default());
	session.focus_editor().unwrap();
	quiesce().await;
	surface.type_text("Oh, ").unwrap();
	quiesce().await;

	assert_eq!(session.get_content_html().await.unwrap(), "<p>Oh, Hi</p>");
	let strip = |html: &str| html.replace("<p>", "").replace("</p>", "");
	assert_eq!(session.get_plain_text(&strip).await.unwrap(), "Oh, Hi");
}

#[tokio::test(start_paused = true)]
async fn silent_surface_bounds_every_wait() {
	let (session, surface, _host) = mount(
		"Hello",
		SurfaceOptions {
			respond: false,
			..SurfaceOptions::default()
		},
	);
	session.focus_editor().unwrap();
	quiesce().await;

	let start = tokio::time::Instant::now();
	assert_eq!(session.get_content_html().await.unwrap(), "Hello");
	let waited = start.elapsed();
	assert!(waited >= ms(500) && waited < ms(505));

	// Serialize times out with nothing to fall back on; the replace still lands.
	assert_eq!(session.set_content_html("Bye").await.unwrap(), ApplyDecision::Applied);
	tokio::time::sleep(ms(700)).await;
	let after = surface.snapshot().await.unwrap();
	assert_eq!(after.html, "Bye");
	assert_eq!(after.restores, 0);
	assert_eq!(session.snapshot().await.unwrap().phase, EditPhase::Idle);
	assert_eq!(session.bridge_status(), BridgeStatus::Unverified);
}

#[tokio::test(start_paused = true)]
async fn selection_round_trips_on_unchanged_structure() {
	init_tracing();
	let (surface, ends) = spawn_surface(SurfaceOptions::default());
	let correlator = Arc::new(Correlator::new(Arc::new(ends.commands.clone()), RequestIdGen::new("sel")));
	ends.commands
		.send(r#"{"command":"init","content":"<p>One <b>two</b></p><p>three</p>","editable":true,"placeholder":""}"#.into())
		.unwrap();
	surface.focus().unwrap();

	// Pump inbound envelopes into the correlator, the way a session loop does.
	let mut inbound = ends.inbound;
	let pump = tokio::spawn({
		let correlator = correlator.clone();
		async move {
			while let Some(raw) = inbound.recv().await {
				if let Ok(envelope) = Envelope::decode(&raw)
					&& let Dispatch::Unmatched(envelope) = correlator.dispatch(envelope)
				{
					panic!("unmatched response {envelope:?}");
				}
			}
		}
	});

	let (_focus_tx, focus_rx) = watch::channel(true);
	let serializer = SelectionSerializer::new(correlator, focus_rx, ms(500));
	let wanted = SerializedSelection {
		anchor_path: vec![0, 1, 0],
		anchor_offset: 1,
		focus_path: vec![1, 0],
		focus_offset: 3,
	};
	assert!(serializer.deserialize(&wanted).await);

	let captured = serializer.serialize().await.unwrap();
	assert_eq!(captured, wanted);
	assert!(serializer.deserialize(&captured).await);
	assert_eq!(serializer.serialize().await.unwrap(), wanted);
	assert_eq!(serializer.last_captured(), Some(wanted));

	assert!(
		!serializer
			.deserialize(&SerializedSelection::caret(vec![7, 0], 0))
			.await
	);
	pump.abort();
}
