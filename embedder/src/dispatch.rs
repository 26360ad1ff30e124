use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flutter_engine_abi::{FlutterTask, TaskSink};
use tracing::warn;

/// Receives batches of expired tasks on the loop's owning thread.
pub trait TaskDispatcher: Send + Sync {
	fn dispatch(&self, tasks: &[FlutterTask]);
}

/// Immediate dispatch: forwards every expired task straight to the
/// sink. Used by the platform task runner.
pub struct PlatformDispatcher {
	sink: Arc<dyn TaskSink>,
}

impl PlatformDispatcher {
	pub fn new(sink: Arc<dyn TaskSink>) -> Self {
		Self { sink }
	}
}

impl TaskDispatcher for PlatformDispatcher {
	fn dispatch(&self, tasks: &[FlutterTask]) {
		for task in tasks {
			self.sink.run_task(task);
		}
	}
}

/// Staged dispatch for the render task runner in Evas-GL style
/// configurations: expired tasks accumulate until the renderer's own
/// callback asks for a flush, and the renderer is notified at most
/// once per pending batch.
pub struct RenderDispatcher {
	staged: Mutex<Vec<FlutterTask>>,
	flush_requested: AtomicBool,
	request_flush: Box<dyn Fn() + Send + Sync>,
}

impl RenderDispatcher {
	pub fn new(request_flush: Box<dyn Fn() + Send + Sync>) -> Self {
		Self {
			staged: Mutex::new(Vec::new()),
			flush_requested: AtomicBool::new(false),
			request_flush,
		}
	}

	/// Runs every staged task against `sink`. Called from the
	/// renderer's frame callback.
	pub fn flush(&self, sink: &dyn TaskSink) {
		// Clear before draining: a dispatch racing with the drain then
		// re-notifies (harmless) instead of stalling its batch behind
		// a flag that the drain is about to consume.
		self.flush_requested.store(false, Ordering::Release);
		let tasks = match self.staged.lock() {
			Ok(mut staged) => std::mem::take(&mut *staged),
			Err(_) => return,
		};
		for task in &tasks {
			sink.run_task(task);
		}
	}
}

impl TaskDispatcher for RenderDispatcher {
	fn dispatch(&self, tasks: &[FlutterTask]) {
		if tasks.is_empty() {
			return;
		}
		match self.staged.lock() {
			Ok(mut staged) => staged.extend_from_slice(tasks),
			Err(_) => {
				warn!("render task staging unavailable; dropping batch");
				return;
			}
		}
		if !self.flush_requested.swap(true, Ordering::AcqRel) {
			(self.request_flush)();
		}
	}
}
