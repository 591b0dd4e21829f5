use std::sync::LazyLock;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Runtime used when the caller is not inside one. It only hosts the
/// blocking pool, so a single async worker is enough.
static FALLBACK: LazyLock<Runtime> = LazyLock::new(|| {
	Builder::new_multi_thread()
		.worker_threads(1)
		.thread_keep_alive(Duration::from_secs(30))
		.thread_name("weft-analysis")
		.build()
		.expect("failed to build weft analysis runtime")
});

fn handle() -> Handle {
	Handle::try_current().unwrap_or_else(|_| FALLBACK.handle().clone())
}

/// Spawns blocking work on the shared blocking pool.
///
/// Callable from any thread: outside a tokio context the work lands on a
/// lazily built process-wide runtime. Start and completion are traced with
/// the task class.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	handle().spawn_blocking(move || {
		let started = Instant::now();
		let out = f();
		tracing::trace!(
			worker_class = class.as_str(),
			elapsed_us = started.elapsed().as_micros() as u64,
			"worker.blocking_done"
		);
		out
	})
}
