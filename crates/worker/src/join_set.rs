use std::future::Future;

use tokio::task::{JoinError, JoinSet};

use crate::TaskClass;

/// Class-tagged wrapper for a Tokio [`JoinSet`].
///
/// Dropping the set aborts every task still in it, which is how a session
/// guarantees nothing it spawned outlives it.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set.
	#[allow(clippy::disallowed_methods)]
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		let handle = crate::spawn::runtime_handle();
		self.inner.spawn_on(fut, &handle);
	}

	/// Waits for the next completed task.
	///
	/// Returns `None` when the set is empty.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Aborts every task in the set.
	pub fn abort_all(&mut self) {
		if !self.inner.is_empty() {
			tracing::trace!(worker_class = self.class.as_str(), aborted = self.inner.len(), "worker.join_set.abort_all");
		}
		self.inner.abort_all();
	}
}
