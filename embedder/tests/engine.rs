use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use flutter_engine_abi::{
	EngineClock, FlutterTask, MonotonicClock, PLATFORM_TASK_RUNNER_IDENTIFIER, TaskSink,
	VsyncSink,
};
use tizen_embedder::engine::{EngineConfig, EngineContext, VblankMode};
use tizen_embedder::ffi;

#[derive(Default)]
struct Recorder {
	tasks: Mutex<Vec<u64>>,
}

impl TaskSink for Recorder {
	fn run_task(&self, task: &FlutterTask) {
		self.tasks.lock().unwrap().push(task.task);
	}
}

#[derive(Default)]
struct VsyncRecorder {
	batons: Mutex<Vec<isize>>,
}

impl VsyncSink for VsyncRecorder {
	fn on_vsync(&self, baton: isize, _start: u64, _target: u64) {
		self.batons.lock().unwrap().push(baton);
	}
}

fn task(id: u64) -> FlutterTask {
	FlutterTask {
		runner: std::ptr::null_mut(),
		task: id,
	}
}

fn headless_context(
	clock: Arc<dyn EngineClock>,
	recorder: Arc<Recorder>,
) -> EngineContext {
	let mut config = EngineConfig::new();
	config.set_headed(false);
	EngineContext::new(
		&config,
		clock,
		recorder as Arc<dyn TaskSink>,
		Arc::new(VsyncRecorder::default()) as Arc<dyn VsyncSink>,
	)
}

#[test]
fn config_defaults() {
	let config = EngineConfig::new();
	assert_eq!(config.engine_lib_path(), Path::new("libflutter_engine.so"));
	assert!(config.headed());
	assert_eq!(config.vblank_mode(), VblankMode::Tdm);
}

#[test]
fn task_runner_bindings_describe_the_platform_loop() {
	let clock = Arc::new(MonotonicClock::new());
	let recorder = Arc::new(Recorder::default());
	let context = headless_context(clock, Arc::clone(&recorder));

	let bindings = context.task_runner_bindings();
	let runners = bindings.custom_task_runners();
	assert!(runners.render_task_runner.is_null());

	let platform = unsafe { &*runners.platform_task_runner };
	assert_eq!(platform.identifier, PLATFORM_TASK_RUNNER_IDENTIFIER);

	// The context was built on this thread, so this thread owns the
	// platform loop.
	let runs_here =
		unsafe { (platform.runs_task_on_current_thread_callback.unwrap())(platform.user_data) };
	assert!(runs_here);

	let user_data = platform.user_data as usize;
	let elsewhere = thread::spawn(move || unsafe {
		(ffi::runs_task_on_current_thread_callback)(user_data as *mut std::os::raw::c_void)
	})
	.join()
	.unwrap();
	assert!(!elsewhere);
}

#[test]
fn posting_through_the_c_callback_reaches_the_sink() {
	let clock = Arc::new(MonotonicClock::new());
	let recorder = Arc::new(Recorder::default());
	let context = headless_context(
		Arc::clone(&clock) as Arc<dyn EngineClock>,
		Arc::clone(&recorder),
	);

	let bindings = context.task_runner_bindings();
	let runners = bindings.custom_task_runners();
	let platform = unsafe { &*runners.platform_task_runner };
	let post = platform.post_task_callback.unwrap();

	unsafe {
		post(task(11), clock.now_nanos(), platform.user_data);
		post(
			task(12),
			clock.now_nanos() + Duration::from_millis(5).as_nanos() as u64,
			platform.user_data,
		);
	}

	let deadline = Instant::now() + Duration::from_secs(5);
	while recorder.tasks.lock().unwrap().len() < 2 {
		assert!(Instant::now() < deadline, "posted tasks never ran");
		context.pump(Duration::from_millis(2));
	}
	assert_eq!(*recorder.tasks.lock().unwrap(), vec![11, 12]);
}

#[test]
fn vsync_requests_flow_through_the_context() {
	let clock = Arc::new(MonotonicClock::new());
	let recorder = Arc::new(Recorder::default());
	let vsync = Arc::new(VsyncRecorder::default());

	let mut config = EngineConfig::new();
	config.set_vblank_mode(VblankMode::Fake {
		interval: Duration::from_millis(5),
	});
	let context = EngineContext::new(
		&config,
		clock,
		recorder as Arc<dyn TaskSink>,
		Arc::clone(&vsync) as Arc<dyn VsyncSink>,
	);

	unsafe { ffi::vsync_callback(context.vsync_user_data(), 9) };

	let deadline = Instant::now() + Duration::from_secs(5);
	while vsync.batons.lock().unwrap().is_empty() {
		assert!(Instant::now() < deadline, "vsync never delivered");
		thread::sleep(Duration::from_millis(1));
	}
	assert_eq!(vsync.batons.lock().unwrap()[0], 9);
}

#[test]
fn render_loop_stages_tasks_until_flushed() {
	let clock = Arc::new(MonotonicClock::new());
	let recorder = Arc::new(Recorder::default());
	let mut context = headless_context(
		Arc::clone(&clock) as Arc<dyn EngineClock>,
		Arc::clone(&recorder),
	);

	let flush_requests = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&flush_requests);
	context.enable_render_loop(Box::new(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	}));

	let render_loop = Arc::clone(context.render_loop().unwrap());
	render_loop.post_task(task(21), clock.now_nanos());
	render_loop.post_task(task(22), clock.now_nanos());

	let deadline = Instant::now() + Duration::from_secs(5);
	while flush_requests.load(Ordering::SeqCst) == 0 {
		assert!(Instant::now() < deadline, "renderer never notified");
		context.pump(Duration::from_millis(2));
	}
	// Staged, not yet run.
	assert!(recorder.tasks.lock().unwrap().is_empty());

	context.flush_render_tasks();
	assert_eq!(*recorder.tasks.lock().unwrap(), vec![21, 22]);
}
