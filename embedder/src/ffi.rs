//! C ABI trampolines registered with the engine. This is the only
//! place `user_data` pointers are cast back to their Rust owners.

use std::os::raw::c_void;

use flutter_engine_abi::FlutterTask;

use crate::engine::EngineContext;
use crate::event_loop::EventLoop;

/// `runs_task_on_current_thread_callback` for a task runner whose
/// `user_data` points at an [`EventLoop`].
///
/// # Safety
/// `user_data` must point at an `EventLoop` that outlives the engine
/// run it was registered with.
pub unsafe extern "C" fn runs_task_on_current_thread_callback(user_data: *mut c_void) -> bool {
	match unsafe { user_data.cast::<EventLoop>().as_ref() } {
		Some(event_loop) => event_loop.runs_tasks_on_current_thread(),
		None => false,
	}
}

/// `post_task_callback` for a task runner whose `user_data` points at
/// an [`EventLoop`].
///
/// # Safety
/// Same contract as [`runs_task_on_current_thread_callback`].
pub unsafe extern "C" fn post_task_callback(
	task: FlutterTask,
	target_time_nanos: u64,
	user_data: *mut c_void,
) {
	if let Some(event_loop) = unsafe { user_data.cast::<EventLoop>().as_ref() } {
		event_loop.post_task(task, target_time_nanos);
	}
}

/// `vsync_callback`; `user_data` points at the [`EngineContext`].
///
/// # Safety
/// `user_data` must come from [`EngineContext::vsync_user_data`] and
/// the context must be alive and unmoved.
pub unsafe extern "C" fn vsync_callback(user_data: *mut c_void, baton: isize) {
	if let Some(context) = unsafe { user_data.cast::<EngineContext>().as_ref() } {
		context.wait_for_vsync(baton);
	}
}
