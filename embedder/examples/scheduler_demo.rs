//! Drives the scheduling core without an engine library: a recording
//! task sink stands in for `FlutterEngineRunTask` and synthetic
//! vblanks stand in for the display server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use flutter_engine_abi::{EngineClock, FlutterTask, MonotonicClock, TaskSink, VsyncSink};
use tizen_embedder::engine::{EngineConfig, EngineContext, VblankMode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

struct LoggingTaskSink {
	executed: AtomicUsize,
}

impl TaskSink for LoggingTaskSink {
	fn run_task(&self, task: &FlutterTask) {
		let count = self.executed.fetch_add(1, Ordering::SeqCst) + 1;
		info!(task = task.task, count, "task expired");
	}
}

struct LoggingVsyncSink;

impl VsyncSink for LoggingVsyncSink {
	fn on_vsync(&self, baton: isize, start: u64, target: u64) {
		info!(baton, start, target, "vsync delivered");
	}
}

fn main() -> anyhow::Result<()> {
	fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let clock = Arc::new(MonotonicClock::new());
	let task_sink = Arc::new(LoggingTaskSink {
		executed: AtomicUsize::new(0),
	});

	let mut config = EngineConfig::from_env();
	config.set_vblank_mode(VblankMode::Fake {
		interval: Duration::from_millis(16),
	});
	let context = EngineContext::new(
		&config,
		Arc::clone(&clock) as Arc<dyn EngineClock>,
		Arc::clone(&task_sink) as Arc<dyn TaskSink>,
		Arc::new(LoggingVsyncSink) as Arc<dyn VsyncSink>,
	);

	// A burst of deferred work with deliberate ties on the 40 ms slot.
	let platform_loop = Arc::clone(context.platform_loop());
	for (id, delay_ms) in [(1u64, 120u64), (2, 40), (3, 40), (4, 80), (5, 0)] {
		let target = clock.now_nanos() + delay_ms * 1_000_000;
		platform_loop.post_task(
			FlutterTask {
				runner: std::ptr::null_mut(),
				task: id,
			},
			target,
		);
	}
	context.wait_for_vsync(1);

	let deadline = Instant::now() + Duration::from_millis(300);
	while Instant::now() < deadline {
		context.pump(Duration::from_millis(8));
	}

	info!(
		executed = task_sink.executed.load(Ordering::SeqCst),
		"demo finished"
	);
	Ok(())
}
