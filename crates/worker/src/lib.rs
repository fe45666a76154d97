//! Task primitives shared by the host session and the reference surface.
//!
//! All spawning goes through this crate so every task carries a [`TaskClass`]
//! in its trace events and a session can be torn down from any of its handles.

mod class;
mod join_set;
mod spawn;
mod token;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use spawn::spawn;
pub use token::ShutdownToken;

/// Extracts the panic message from a failed task, if it panicked.
///
/// Returns `None` for cancelled tasks.
pub fn join_error_panic_message(err: tokio::task::JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		Some((*msg).to_owned())
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		Some(msg.clone())
	} else {
		Some("non-string panic payload".to_owned())
	}
}
