use std::mem;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::thread;
use std::time::Duration;

use flutter_engine_abi::{
	EngineClock, EngineProcTable, FlutterCustomTaskRunners, FlutterEngineHandle, FlutterTask,
	FlutterTaskRunnerDescription, PLATFORM_TASK_RUNNER_IDENTIFIER, RENDER_TASK_RUNNER_IDENTIFIER,
	TaskSink, VsyncSink,
};
use tdm_client::{FakeVblank, TdmClient, TdmLibrary, VblankSource};
use tracing::{debug, error, warn};

use crate::dispatch::{PlatformDispatcher, RenderDispatcher, TaskDispatcher};
use crate::event_loop::EventLoop;
use crate::ffi;
use crate::vsync::VsyncWaiter;

/// Where vblank notifications come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VblankMode {
	/// The display server's vblank service.
	Tdm,
	/// Synthetic timer-driven vblanks at a fixed interval.
	Fake { interval: Duration },
}

/// Embedder configuration consumed at context creation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
	engine_lib_path: PathBuf,
	headed: bool,
	vblank_mode: VblankMode,
}

impl EngineConfig {
	pub fn new() -> Self {
		Self {
			engine_lib_path: "libflutter_engine.so".into(),
			headed: true,
			vblank_mode: VblankMode::Tdm,
		}
	}

	/// Creates a configuration from process environment.
	/// `FLUTTER_ENGINE_PATH` overrides the engine library location.
	pub fn from_env() -> Self {
		let mut config = Self::new();
		if let Ok(path) = std::env::var("FLUTTER_ENGINE_PATH") {
			config.engine_lib_path = path.into();
		}
		config
	}

	/// Sets the engine shared library path.
	pub fn set_engine_lib_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
		self.engine_lib_path = path.as_ref().to_path_buf();
		self
	}

	/// Headless contexts get no vsync waiter at all.
	pub fn set_headed(&mut self, headed: bool) -> &mut Self {
		self.headed = headed;
		self
	}

	pub fn set_vblank_mode(&mut self, mode: VblankMode) -> &mut Self {
		self.vblank_mode = mode;
		self
	}

	pub fn engine_lib_path(&self) -> &Path {
		&self.engine_lib_path
	}

	pub fn headed(&self) -> bool {
		self.headed
	}

	pub fn vblank_mode(&self) -> VblankMode {
		self.vblank_mode
	}
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Forwards expired tasks and vblank deliveries to a running engine
/// through its proc table. Until `attach_engine` is called the
/// deliveries are dropped with a log, mirroring the window between
/// loop creation and engine startup.
pub struct EngineSinkAdapter {
	table: Arc<EngineProcTable>,
	engine: AtomicPtr<c_void>,
}

impl EngineSinkAdapter {
	pub fn new(table: Arc<EngineProcTable>) -> Self {
		Self {
			table,
			engine: AtomicPtr::new(std::ptr::null_mut()),
		}
	}

	/// Records the engine handle once `FlutterEngineRun` succeeded.
	pub fn attach_engine(&self, engine: FlutterEngineHandle) {
		self.engine.store(engine, Ordering::Release);
	}

	fn engine(&self) -> Option<FlutterEngineHandle> {
		let handle = self.engine.load(Ordering::Acquire);
		if handle.is_null() { None } else { Some(handle) }
	}
}

impl TaskSink for EngineSinkAdapter {
	fn run_task(&self, task: &FlutterTask) {
		let Some(engine) = self.engine() else {
			warn!("engine not running; expired task dropped");
			return;
		};
		if let Err(e) = self.table.run_task(engine, task) {
			error!("engine task execution failed: {e}");
		}
	}
}

impl VsyncSink for EngineSinkAdapter {
	fn on_vsync(&self, baton: isize, frame_start_time_nanos: u64, frame_target_time_nanos: u64) {
		let Some(engine) = self.engine() else {
			warn!(baton, "engine not running; vsync delivery dropped");
			return;
		};
		if let Err(e) =
			self.table
				.on_vsync(engine, baton, frame_start_time_nanos, frame_target_time_nanos)
		{
			error!(baton, "vsync delivery failed: {e}");
		}
	}
}

/// Owned `FlutterTaskRunnerDescription` storage whose addresses stay
/// stable for the duration of the engine run call.
pub struct TaskRunnerBindings {
	platform: Box<FlutterTaskRunnerDescription>,
	render: Option<Box<FlutterTaskRunnerDescription>>,
}

impl TaskRunnerBindings {
	/// Builds the aggregate handed to the engine. The returned struct
	/// borrows from `self`; keep the bindings alive across the call.
	pub fn custom_task_runners(&self) -> FlutterCustomTaskRunners {
		FlutterCustomTaskRunners {
			struct_size: mem::size_of::<FlutterCustomTaskRunners>(),
			platform_task_runner: &*self.platform,
			render_task_runner: self
				.render
				.as_deref()
				.map_or(std::ptr::null(), |render| render as *const _),
		}
	}
}

/// Composition root: owns the platform loop, the optional render
/// loop, and the vsync waiter, and wires them to the engine ABI.
pub struct EngineContext {
	clock: Arc<dyn EngineClock>,
	task_sink: Arc<dyn TaskSink>,
	platform_loop: Arc<EventLoop>,
	render_loop: Option<Arc<EventLoop>>,
	render_dispatcher: Option<Arc<RenderDispatcher>>,
	vsync_waiter: Option<VsyncWaiter>,
}

impl EngineContext {
	/// Builds the context on the platform thread; both task loops are
	/// owned by the calling thread.
	pub fn new(
		config: &EngineConfig,
		clock: Arc<dyn EngineClock>,
		task_sink: Arc<dyn TaskSink>,
		vsync_sink: Arc<dyn VsyncSink>,
	) -> Self {
		let owner = thread::current().id();
		let platform_loop = Arc::new(EventLoop::new(
			owner,
			Arc::clone(&clock),
			Arc::new(PlatformDispatcher::new(Arc::clone(&task_sink))),
		));

		let vsync_waiter = if config.headed() {
			Some(match config.vblank_mode() {
				VblankMode::Tdm => VsyncWaiter::spawn(vsync_sink, || {
					let lib = TdmLibrary::open()?;
					let client = TdmClient::connect(lib)?;
					Ok(Box::new(client) as Box<dyn VblankSource>)
				}),
				VblankMode::Fake { interval } => VsyncWaiter::spawn(vsync_sink, move || {
					Ok(Box::new(FakeVblank::new(interval)) as Box<dyn VblankSource>)
				}),
			})
		} else {
			None
		};

		Self {
			clock,
			task_sink,
			platform_loop,
			render_loop: None,
			render_dispatcher: None,
			vsync_waiter,
		}
	}

	/// Adds the second loop used by Evas-GL style configurations,
	/// where render tasks are staged until the renderer's frame
	/// callback flushes them. `request_flush` is invoked (once per
	/// pending batch) to schedule that callback.
	pub fn enable_render_loop(&mut self, request_flush: Box<dyn Fn() + Send + Sync>) {
		let dispatcher = Arc::new(RenderDispatcher::new(request_flush));
		let render_loop = Arc::new(EventLoop::new(
			thread::current().id(),
			Arc::clone(&self.clock),
			Arc::clone(&dispatcher) as Arc<dyn TaskDispatcher>,
		));
		self.render_dispatcher = Some(dispatcher);
		self.render_loop = Some(render_loop);
	}

	pub fn platform_loop(&self) -> &Arc<EventLoop> {
		&self.platform_loop
	}

	pub fn render_loop(&self) -> Option<&Arc<EventLoop>> {
		self.render_loop.as_ref()
	}

	/// Runs every staged render task. Call from the renderer's frame
	/// callback on the owning thread.
	pub fn flush_render_tasks(&self) {
		if let Some(dispatcher) = &self.render_dispatcher {
			dispatcher.flush(self.task_sink.as_ref());
		}
	}

	/// Target of the engine's `vsync_callback`.
	pub fn wait_for_vsync(&self, baton: isize) {
		match &self.vsync_waiter {
			Some(waiter) => waiter.async_wait_for_vsync(baton),
			None => debug!(baton, "no vsync waiter; request ignored"),
		}
	}

	/// One iteration of the platform thread's native loop.
	pub fn pump(&self, max_wait: Duration) {
		self.platform_loop.pump(max_wait);
		if let Some(render_loop) = &self.render_loop {
			render_loop.pump(Duration::ZERO);
		}
	}

	/// Builds the task runner registrations handed to
	/// `FlutterEngineRun`. The embedded `user_data` pointers stay
	/// valid for as long as this context lives.
	pub fn task_runner_bindings(&self) -> TaskRunnerBindings {
		TaskRunnerBindings {
			platform: Box::new(runner_description(
				&self.platform_loop,
				PLATFORM_TASK_RUNNER_IDENTIFIER,
			)),
			render: self
				.render_loop
				.as_ref()
				.map(|render| Box::new(runner_description(render, RENDER_TASK_RUNNER_IDENTIFIER))),
		}
	}

	/// `user_data` for `ffi::vsync_callback`. Valid while the context
	/// is alive and not moved.
	pub fn vsync_user_data(&self) -> *mut c_void {
		(self as *const Self as *mut Self).cast()
	}
}

fn runner_description(
	event_loop: &Arc<EventLoop>,
	identifier: usize,
) -> FlutterTaskRunnerDescription {
	FlutterTaskRunnerDescription {
		struct_size: mem::size_of::<FlutterTaskRunnerDescription>(),
		user_data: Arc::as_ptr(event_loop) as *mut c_void,
		runs_task_on_current_thread_callback: Some(ffi::runs_task_on_current_thread_callback),
		post_task_callback: Some(ffi::post_task_callback),
		identifier,
	}
}
