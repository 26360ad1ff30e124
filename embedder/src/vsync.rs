use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use flutter_engine_abi::VsyncSink;
use tdm_client::{TdmError, VblankSource};
use tracing::{debug, error, warn};

/// Nominal frame interval used to derive the frame target time.
/// Hard-coded rather than queried from the display, matching the
/// known simplification in this design.
pub const NOMINAL_FRAME_INTERVAL_NANOS: u64 = 16_600_000;

enum WaiterMessage {
	Wait { baton: isize },
	Quit,
}

/// Bridges display-server vblanks to engine frame callbacks.
///
/// A dedicated worker thread owns the vblank source for its whole
/// life: it is created there, blocks there, and is torn down there
/// when the worker drains its mailbox and exits. Dropping the waiter
/// sends a quit message ordered behind any in-flight wait request and
/// joins the worker, so no callback can arrive after the destructor
/// returns.
pub struct VsyncWaiter {
	tx: mpsc::Sender<WaiterMessage>,
	worker: Option<thread::JoinHandle<()>>,
	outstanding: Arc<AtomicBool>,
}

impl VsyncWaiter {
	/// Spawns the worker. `make_source` runs on the worker thread; if
	/// it fails the worker exits and the waiter stays permanently
	/// degraded (wait requests are dropped, no retry).
	pub fn spawn<F>(sink: Arc<dyn VsyncSink>, make_source: F) -> Self
	where
		F: FnOnce() -> Result<Box<dyn VblankSource>, TdmError> + Send + 'static,
	{
		let (tx, rx) = mpsc::channel();
		let outstanding = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&outstanding);
		let worker = thread::Builder::new()
			.name("vsync-waiter".into())
			.spawn(move || worker_loop(rx, sink, make_source, flag));
		let worker = match worker {
			Ok(handle) => Some(handle),
			Err(e) => {
				error!("failed to spawn vsync worker: {e}");
				None
			}
		};
		Self {
			tx,
			worker,
			outstanding,
		}
	}

	/// Asks for one callback at the next vblank, correlated by
	/// `baton`. At most one request may be outstanding; a concurrent
	/// second request is rejected and logged rather than silently
	/// overwriting the first baton.
	pub fn async_wait_for_vsync(&self, baton: isize) {
		if self.outstanding.swap(true, Ordering::AcqRel) {
			warn!(baton, "vblank wait already outstanding; request rejected");
			return;
		}
		if self.tx.send(WaiterMessage::Wait { baton }).is_err() {
			self.outstanding.store(false, Ordering::Release);
			debug!(baton, "vsync worker unavailable; wait request dropped");
		}
	}
}

impl Drop for VsyncWaiter {
	fn drop(&mut self) {
		// Quit travels through the same mailbox as wait requests, so
		// the worker finishes in-flight work before it sees it.
		let _ = self.tx.send(WaiterMessage::Quit);
		if let Some(worker) = self.worker.take() {
			let _ = worker.join();
		}
	}
}

fn worker_loop<F>(
	rx: mpsc::Receiver<WaiterMessage>,
	sink: Arc<dyn VsyncSink>,
	make_source: F,
	outstanding: Arc<AtomicBool>,
) where
	F: FnOnce() -> Result<Box<dyn VblankSource>, TdmError>,
{
	let mut source = match make_source() {
		Ok(source) => source,
		Err(e) => {
			error!("vblank source setup failed: {e}");
			return;
		}
	};
	debug!("vsync worker ready");
	while let Ok(message) = rx.recv() {
		match message {
			WaiterMessage::Quit => break,
			WaiterMessage::Wait { baton } => match source.wait_for_vblank() {
				Ok(instant) => {
					let frame_start_time_nanos = instant.timestamp_nanos();
					let frame_target_time_nanos =
						frame_start_time_nanos + NOMINAL_FRAME_INTERVAL_NANOS;
					// Clear before delivering so the engine can
					// request the next frame from inside the
					// callback.
					outstanding.store(false, Ordering::Release);
					sink.on_vsync(baton, frame_start_time_nanos, frame_target_time_nanos);
				}
				Err(e) => {
					outstanding.store(false, Ordering::Release);
					warn!(baton, "vblank wait failed: {e}");
				}
			},
		}
	}
	debug!("vsync worker stopped");
}
