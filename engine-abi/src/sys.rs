use std::os::raw::c_void;

/// Opaque engine instance handle (`FLUTTER_API_SYMBOL(FlutterEngine)`).
pub type FlutterEngineHandle = *mut c_void;

/// Runner identifier reported for the platform task runner.
pub const PLATFORM_TASK_RUNNER_IDENTIFIER: usize = 1;
/// Runner identifier reported for the render task runner.
pub const RENDER_TASK_RUNNER_IDENTIFIER: usize = 2;

/// A unit of deferred work handed out by the engine.
///
/// Both fields are opaque tokens; the embedder never dereferences
/// `runner` and must pass the whole struct back unmodified through
/// `FlutterEngineRunTask`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FlutterTask {
	pub runner: *mut c_void,
	pub task: u64,
}

// Task handles travel from arbitrary engine threads to the loop's
// owning thread as plain data; `runner` is never dereferenced on
// this side of the ABI.
unsafe impl Send for FlutterTask {}
unsafe impl Sync for FlutterTask {}

/// Result codes returned by engine entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlutterEngineResult {
	Success = 0,
	InvalidLibraryVersion = 1,
	InvalidArguments = 2,
	InternalInconsistency = 3,
}

/// `runs_task_on_current_thread_callback` shape.
pub type BoolCallback = unsafe extern "C" fn(user_data: *mut c_void) -> bool;

/// `post_task_callback` shape.
pub type PostTaskCallback =
	unsafe extern "C" fn(task: FlutterTask, target_time_nanos: u64, user_data: *mut c_void);

/// `vsync_callback` shape; `baton` correlates the request with the
/// eventual `FlutterEngineOnVsync` delivery.
pub type VsyncCallback = unsafe extern "C" fn(user_data: *mut c_void, baton: isize);

/// Per-runner registration passed to the engine at startup.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FlutterTaskRunnerDescription {
	pub struct_size: usize,
	pub user_data: *mut c_void,
	pub runs_task_on_current_thread_callback: Option<BoolCallback>,
	pub post_task_callback: Option<PostTaskCallback>,
	pub identifier: usize,
}

/// Aggregate of the custom task runners handed to the engine.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FlutterCustomTaskRunners {
	pub struct_size: usize,
	pub platform_task_runner: *const FlutterTaskRunnerDescription,
	pub render_task_runner: *const FlutterTaskRunnerDescription,
}
