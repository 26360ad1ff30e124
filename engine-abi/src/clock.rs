use std::time::Instant;

/// Source of the engine's nanosecond clock domain.
///
/// Posted task target times are expressed in this domain, so the
/// event loop needs the same clock to translate them into local
/// fire times. The engine proc table implements this by calling
/// `FlutterEngineGetCurrentTime`.
pub trait EngineClock: Send + Sync {
	fn now_nanos(&self) -> u64;
}

/// Steady-clock stand-in used when no engine library is loaded
/// (demos, tests).
pub struct MonotonicClock {
	epoch: Instant,
}

impl MonotonicClock {
	pub fn new() -> Self {
		Self {
			epoch: Instant::now(),
		}
	}
}

impl Default for MonotonicClock {
	fn default() -> Self {
		Self::new()
	}
}

impl EngineClock for MonotonicClock {
	fn now_nanos(&self) -> u64 {
		self.epoch.elapsed().as_nanos() as u64
	}
}
