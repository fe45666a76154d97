use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::Instant;

use super::*;

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

fn coordinator(initial: &str) -> EditCoordinator {
	EditCoordinator::new(initial, &SessionConfig::default())
}

#[test]
fn redundant_request_is_a_no_op() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	assert_eq!(state.request_apply_remote("Hello", t0), ApplyDecision::Unchanged);
	assert_eq!(state.phase(), EditPhase::Idle);
	assert_eq!(state.pending_remote(), None);
	assert!(!state.is_local_change(t0));
}

#[test]
fn idle_request_applies_immediately() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	assert_eq!(state.request_apply_remote("Hello world", t0), ApplyDecision::Applied);
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
	assert_eq!(state.last_known(), "Hello world");
	assert_eq!(state.finish_apply(t0 + ms(150)), None);
	assert_eq!(state.phase(), EditPhase::Idle);
}

#[test]
fn local_change_enters_typing_and_restarts_settle() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	assert_eq!(state.notify_local_change("H", t0), LocalChange::Accepted);
	assert_eq!(state.settle_deadline(), Some(t0 + ms(400)));
	assert_eq!(state.notify_local_change("Hi", t0 + ms(100)), LocalChange::Accepted);
	assert_eq!(state.settle_deadline(), Some(t0 + ms(500)));
	assert_eq!(state.notify_local_change("Hi", t0 + ms(120)), LocalChange::Ignored);
	assert_eq!(state.settle_deadline(), Some(t0 + ms(500)));
}

#[test]
fn typing_defers_remote_until_settle() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello world");
	state.notify_local_change("Hi", t0);
	assert_eq!(state.request_apply_remote("Bye", t0 + ms(10)), ApplyDecision::Deferred);
	assert_eq!(state.last_known(), "Hi");

	assert_eq!(state.on_settle(t0 + ms(399)), None);
	assert_eq!(state.last_known(), "Hi");

	assert_eq!(state.on_settle(t0 + ms(400)).as_deref(), Some("Bye"));
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
	assert_eq!(state.last_known(), "Bye");

	assert_eq!(state.finish_apply(t0 + ms(550)), None);
	assert_eq!(state.on_settle(t0 + ms(900)), None);
}

#[test]
fn last_write_wins_while_typing() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	state.notify_local_change("typing", t0);
	assert_eq!(state.request_apply_remote("first", t0), ApplyDecision::Deferred);
	assert_eq!(state.request_apply_remote("second", t0), ApplyDecision::Deferred);
	assert_eq!(state.pending_remote(), Some("second"));
	assert_eq!(state.on_settle(t0 + ms(400)).as_deref(), Some("second"));
	assert_eq!(state.pending_remote(), None);
}

#[test]
fn host_echo_of_recent_local_snapshot_is_suppressed() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	state.notify_local_change("H", t0);
	state.notify_local_change("Hi", t0 + ms(50));
	assert!(state.is_local_change(t0 + ms(100)));
	assert_eq!(state.request_apply_remote("H", t0 + ms(100)), ApplyDecision::Suppressed);
	assert_eq!(state.pending_remote(), None);

	assert!(!state.is_local_change(t0 + ms(250)));
	assert_eq!(state.request_apply_remote("H", t0 + ms(260)), ApplyDecision::Deferred);
}

#[test]
fn replace_report_during_apply_is_absorbed() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("<p>Bye</p>", t0);

	assert_eq!(state.notify_local_change("<p>Bye </p>", t0 + ms(5)), LocalChange::Absorbed);
	assert_eq!(state.last_known(), "<p>Bye </p>");
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
	assert!(!state.is_local_change(t0 + ms(5)));

	state.finish_apply(t0 + ms(160));
	assert_eq!(state.notify_local_change("<p>Bye !</p>", t0 + ms(170)), LocalChange::Accepted);
	assert!(matches!(state.phase(), EditPhase::LocalEditing { .. }));
}

#[test]
fn late_replace_report_is_absorbed_once() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("<p>Bye</p>", t0);
	state.finish_apply(t0 + ms(1));

	assert_eq!(state.notify_local_change("<p>Bye </p>", t0 + ms(2)), LocalChange::Absorbed);
	assert_eq!(state.phase(), EditPhase::Idle);
	assert_eq!(state.notify_local_change("<p>Bye !</p>", t0 + ms(3)), LocalChange::Accepted);
}

#[test]
fn identical_replace_report_closes_the_guard() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("Bye", t0);
	state.finish_apply(t0 + ms(1));

	assert_eq!(state.notify_local_change("Bye", t0 + ms(2)), LocalChange::Ignored);
	assert_eq!(state.notify_local_change("Bye!", t0 + ms(3)), LocalChange::Accepted);
}

#[test]
fn missing_replace_report_stops_guarding_after_the_window() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("Bye", t0);
	state.finish_apply(t0 + ms(1));

	assert_eq!(state.notify_local_change("Bye!", t0 + ms(250)), LocalChange::Accepted);
}

#[test]
fn only_the_owed_replace_report_is_absorbed_while_applying() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("Bye", t0);
	assert_eq!(state.notify_local_change("Bye", t0 + ms(1)), LocalChange::Ignored);

	assert_eq!(state.notify_local_change("XBye", t0 + ms(50)), LocalChange::Accepted);
	assert_eq!(state.last_known(), "XBye");
	assert!(state.is_local_change(t0 + ms(60)));
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
}

#[test]
fn typing_while_applying_resumes_the_burst_and_holds_pending() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");
	state.request_apply_remote("Bye", t0);
	state.notify_local_change("<p>Bye</p>", t0 + ms(1));
	state.notify_local_change("<p>XBye</p>", t0 + ms(50));
	assert_eq!(state.request_apply_remote("Remote", t0 + ms(100)), ApplyDecision::Deferred);

	assert_eq!(state.finish_apply(t0 + ms(150)), None);
	assert_eq!(state.phase(), EditPhase::LocalEditing { settle_at: t0 + ms(450) });
	assert_eq!(state.pending_remote(), Some("Remote"));

	assert_eq!(state.on_settle(t0 + ms(449)), None);
	assert_eq!(state.on_settle(t0 + ms(450)).as_deref(), Some("Remote"));
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
}

#[test]
fn request_during_apply_runs_after_it() {
	let t0 = Instant::now();
	let mut state = coordinator("a");
	assert_eq!(state.request_apply_remote("b", t0), ApplyDecision::Applied);
	assert_eq!(state.request_apply_remote("c", t0 + ms(10)), ApplyDecision::Deferred);
	assert_eq!(state.request_apply_remote("d", t0 + ms(20)), ApplyDecision::Deferred);

	assert_eq!(state.finish_apply(t0 + ms(150)).as_deref(), Some("d"));
	assert_eq!(state.phase(), EditPhase::ApplyingRemote);
	assert_eq!(state.finish_apply(t0 + ms(300)), None);
	assert_eq!(state.last_known(), "d");
}

#[test]
fn request_matching_current_content_drops_stale_pending() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	state.notify_local_change("Hi", t0);
	state.request_apply_remote("Bye", t0);
	assert_eq!(state.request_apply_remote("Hi", t0 + ms(300)), ApplyDecision::Unchanged);
	assert_eq!(state.on_settle(t0 + ms(400)), None);
}

#[test]
fn unserviced_settle_does_not_block_a_new_request() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	state.notify_local_change("Hi", t0);
	assert_eq!(state.request_apply_remote("Bye", t0 + ms(450)), ApplyDecision::Applied);
	assert_eq!(state.last_known(), "Bye");
}

#[test]
fn reset_clears_everything_but_content() {
	let t0 = Instant::now();
	let mut state = coordinator("");
	state.notify_local_change("Hi", t0);
	state.request_apply_remote("Bye", t0);
	state.reset();
	assert_eq!(state.phase(), EditPhase::Idle);
	assert_eq!(state.pending_remote(), None);
	assert!(!state.is_local_change(t0));
	assert_eq!(state.last_known(), "Hi");
}

#[test]
fn scenario_hello_world_then_typing_then_bye() {
	let t0 = Instant::now();
	let mut state = coordinator("Hello");

	assert_eq!(state.request_apply_remote("Hello", t0), ApplyDecision::Unchanged);

	assert_eq!(state.request_apply_remote("Hello world", t0), ApplyDecision::Applied);
	assert_eq!(state.last_known(), "Hello world");
	assert_eq!(state.notify_local_change("Hello world", t0 + ms(1)), LocalChange::Ignored);
	state.finish_apply(t0 + ms(150));

	let typed = t0 + ms(1000);
	assert_eq!(state.notify_local_change("Hi", typed), LocalChange::Accepted);
	assert_eq!(state.request_apply_remote("Bye", typed + ms(50)), ApplyDecision::Deferred);
	assert_eq!(state.last_known(), "Hi");

	assert_eq!(state.on_settle(typed + ms(400)).as_deref(), Some("Bye"));
	assert_eq!(state.last_known(), "Bye");
	assert_eq!(state.finish_apply(typed + ms(550)), None);
	assert_eq!(state.on_settle(typed + ms(1000)), None);
}
