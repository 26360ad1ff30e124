use crate::sys::FlutterTask;

/// Receives expired tasks on the owning thread of their runner.
///
/// The production implementation forwards to `FlutterEngineRunTask`;
/// tests substitute a recorder.
pub trait TaskSink: Send + Sync {
	fn run_task(&self, task: &FlutterTask);
}

/// Receives vblank deliveries on the vsync worker thread.
///
/// The production implementation forwards to `FlutterEngineOnVsync`;
/// any further thread hop is the engine's business.
pub trait VsyncSink: Send + Sync {
	fn on_vsync(&self, baton: isize, frame_start_time_nanos: u64, frame_target_time_nanos: u64);
}
