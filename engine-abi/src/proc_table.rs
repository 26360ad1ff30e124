use std::path::Path;

use crate::clock::EngineClock;
use crate::error::AbiError;
use crate::sys::{FlutterEngineHandle, FlutterEngineResult, FlutterTask};

type RunTaskFn =
	unsafe extern "C" fn(FlutterEngineHandle, *const FlutterTask) -> FlutterEngineResult;
type OnVsyncFn =
	unsafe extern "C" fn(FlutterEngineHandle, isize, u64, u64) -> FlutterEngineResult;
type GetCurrentTimeFn = unsafe extern "C" fn() -> u64;

/// Engine entry points used by the scheduling core, resolved from the
/// engine shared library at runtime.
pub struct EngineProcTable {
	run_task: RunTaskFn,
	on_vsync: OnVsyncFn,
	get_current_time: GetCurrentTimeFn,
	_lib: libloading::Library,
}

impl EngineProcTable {
	/// Loads `libflutter_engine.so` (or an explicit path) and resolves
	/// the entry points this core calls back into.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, AbiError> {
		let lib = unsafe { libloading::Library::new(path.as_ref()) }
			.map_err(|e| AbiError::LoadEngineLibrary(e.to_string()))?;
		let run_task = load_fn::<RunTaskFn>(&lib, b"FlutterEngineRunTask\0", "FlutterEngineRunTask")?;
		let on_vsync = load_fn::<OnVsyncFn>(&lib, b"FlutterEngineOnVsync\0", "FlutterEngineOnVsync")?;
		let get_current_time = load_fn::<GetCurrentTimeFn>(
			&lib,
			b"FlutterEngineGetCurrentTime\0",
			"FlutterEngineGetCurrentTime",
		)?;
		Ok(Self {
			run_task,
			on_vsync,
			get_current_time,
			_lib: lib,
		})
	}

	/// Executes one expired task. Must be called on the thread of the
	/// runner the task was posted to.
	pub fn run_task(
		&self,
		engine: FlutterEngineHandle,
		task: &FlutterTask,
	) -> Result<(), AbiError> {
		let code = unsafe { (self.run_task)(engine, task) };
		if code != FlutterEngineResult::Success {
			return Err(AbiError::EngineCall {
				call: "FlutterEngineRunTask",
				code,
			});
		}
		Ok(())
	}

	/// Delivers a vblank notification for `baton`.
	pub fn on_vsync(
		&self,
		engine: FlutterEngineHandle,
		baton: isize,
		frame_start_time_nanos: u64,
		frame_target_time_nanos: u64,
	) -> Result<(), AbiError> {
		let code = unsafe {
			(self.on_vsync)(engine, baton, frame_start_time_nanos, frame_target_time_nanos)
		};
		if code != FlutterEngineResult::Success {
			return Err(AbiError::EngineCall {
				call: "FlutterEngineOnVsync",
				code,
			});
		}
		Ok(())
	}
}

impl EngineClock for EngineProcTable {
	fn now_nanos(&self) -> u64 {
		unsafe { (self.get_current_time)() }
	}
}

fn load_fn<T: Copy>(
	lib: &libloading::Library,
	symbol: &[u8],
	name: &'static str,
) -> Result<T, AbiError> {
	let sym = unsafe { lib.get::<T>(symbol) }.map_err(|_| AbiError::MissingSymbol(name))?;
	Ok(*sym)
}
