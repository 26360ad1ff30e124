//! Flutter engine embedder ABI surface used by the scheduling core.

mod clock;
mod error;
mod proc_table;
mod sink;
mod sys;

pub use clock::{EngineClock, MonotonicClock};
pub use error::AbiError;
pub use proc_table::EngineProcTable;
pub use sink::{TaskSink, VsyncSink};
pub use sys::{
	BoolCallback, FlutterCustomTaskRunners, FlutterEngineHandle, FlutterEngineResult, FlutterTask,
	FlutterTaskRunnerDescription, PostTaskCallback, VsyncCallback,
	PLATFORM_TASK_RUNNER_IDENTIFIER, RENDER_TASK_RUNNER_IDENTIFIER,
};
