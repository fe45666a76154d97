use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("scribe-host")
			.build()
			.expect("failed to build scribe host runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task tagged with `class`.
///
/// Uses the ambient tokio runtime when called from one, otherwise a lazily
/// built single-worker host runtime.
#[allow(clippy::disallowed_methods)]
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}
