use std::os::raw::c_uint;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::TdmError;

/// Hardware timestamp of one vblank, as reported by the display
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VblankInstant {
	pub tv_sec: c_uint,
	pub tv_usec: c_uint,
}

impl VblankInstant {
	/// Frame start time in nanoseconds.
	pub fn timestamp_nanos(&self) -> u64 {
		u64::from(self.tv_sec) * 1_000_000_000 + u64::from(self.tv_usec) * 1_000
	}
}

/// Blocking provider of vblank notifications.
///
/// Implementations are moved onto the vsync worker thread and used
/// exclusively there; each `wait_for_vblank` call blocks until the
/// next vblank and must be bounded in time.
pub trait VblankSource: Send {
	fn wait_for_vblank(&mut self) -> Result<VblankInstant, TdmError>;
}

/// Timer-driven vblank source for hosts without a display service
/// and for tests. Ticks are aligned to interval boundaries from a
/// fixed epoch, like the fake vblanks tdm synthesizes for disabled
/// outputs.
pub struct FakeVblank {
	interval: Duration,
	epoch: Instant,
}

impl FakeVblank {
	pub fn new(interval: Duration) -> Self {
		Self {
			interval,
			epoch: Instant::now(),
		}
	}
}

impl VblankSource for FakeVblank {
	fn wait_for_vblank(&mut self) -> Result<VblankInstant, TdmError> {
		let elapsed = self.epoch.elapsed();
		let ticks = elapsed.as_nanos() / self.interval.as_nanos() + 1;
		let target_nanos = self.interval.as_nanos() * ticks;
		let target = Duration::new(
			(target_nanos / 1_000_000_000) as u64,
			(target_nanos % 1_000_000_000) as u32,
		);
		thread::sleep(target.saturating_sub(elapsed));
		Ok(VblankInstant {
			tv_sec: target.as_secs() as c_uint,
			tv_usec: target.subsec_micros() as c_uint,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::{FakeVblank, VblankInstant, VblankSource};
	use std::time::Duration;

	#[test]
	fn timestamp_combines_seconds_and_micros() {
		let instant = VblankInstant {
			tv_sec: 2,
			tv_usec: 500,
		};
		assert_eq!(instant.timestamp_nanos(), 2_000_000_000 + 500_000);
	}

	#[test]
	fn fake_vblank_ticks_are_strictly_increasing() {
		let mut source = FakeVblank::new(Duration::from_millis(2));
		let first = source.wait_for_vblank().unwrap();
		let second = source.wait_for_vblank().unwrap();
		assert!(second.timestamp_nanos() > first.timestamp_nanos());
	}
}
