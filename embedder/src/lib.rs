//! Scheduling core of a Flutter embedder for Tizen-like display
//! stacks: the cross-thread task loops the engine posts deferred work
//! to, and the vsync waiter that turns display-server vblanks into
//! engine frame callbacks.

mod dispatch;
mod error;
mod event_loop;
mod timer_queue;
mod vsync;
mod wakeup;

pub mod engine;
pub mod ffi;

pub use dispatch::{PlatformDispatcher, RenderDispatcher, TaskDispatcher};
pub use error::LoopError;
pub use event_loop::EventLoop;
pub use vsync::{NOMINAL_FRAME_INTERVAL_NANOS, VsyncWaiter};
