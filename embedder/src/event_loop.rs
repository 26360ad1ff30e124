use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use flutter_engine_abi::{EngineClock, FlutterTask};
use tracing::{error, warn};

use crate::dispatch::TaskDispatcher;
use crate::timer_queue::{TaskRecord, TimerQueue};
use crate::wakeup::{WakeupChannel, WireRecord};

/// Time-ordered task executor pinned to one native thread.
///
/// The engine posts tasks from arbitrary internal threads; every post
/// crosses the wakeup channel and is executed on the owning thread,
/// in `(fire_time, insertion_order)` order, never early.
pub struct EventLoop {
	owner: ThreadId,
	epoch: Instant,
	clock: Arc<dyn EngineClock>,
	dispatcher: Arc<dyn TaskDispatcher>,
	queue: Mutex<TimerQueue>,
	next_order: AtomicU64,
	channel: Option<WakeupChannel>,
}

impl EventLoop {
	/// `owner` is the thread that will pump this loop; it is the only
	/// thread tasks ever execute on.
	pub fn new(
		owner: ThreadId,
		clock: Arc<dyn EngineClock>,
		dispatcher: Arc<dyn TaskDispatcher>,
	) -> Self {
		let channel = match WakeupChannel::new() {
			Ok(channel) => Some(channel),
			Err(e) => {
				// The post callback ABI has no failure channel, so a
				// missing pipe leaves the loop permanently inert.
				error!("event loop wakeup channel unavailable: {e}");
				None
			}
		};
		Self {
			owner,
			epoch: Instant::now(),
			clock,
			dispatcher,
			queue: Mutex::new(TimerQueue::new()),
			next_order: AtomicU64::new(0),
			channel,
		}
	}

	/// True iff called on the loop's owning thread.
	pub fn runs_tasks_on_current_thread(&self) -> bool {
		thread::current().id() == self.owner
	}

	/// Schedules `task` for execution at `target_time_nanos` in the
	/// engine's clock domain. Any thread; never blocks on execution.
	pub fn post_task(&self, task: FlutterTask, target_time_nanos: u64) {
		let Some(channel) = &self.channel else {
			warn!("event loop has no wakeup channel; dropping posted task");
			return;
		};
		let order = self.next_order.fetch_add(1, Ordering::Relaxed) + 1;
		let fire_time = self.fire_time_for(target_time_nanos);
		let record = WireRecord {
			order,
			fire_offset_nanos: fire_time.saturating_duration_since(self.epoch).as_nanos() as u64,
			runner: task.runner as u64,
			task: task.task,
		};
		if let Err(e) = channel.send(&record) {
			warn!("failed to post task to event loop: {e}");
		}
	}

	/// Translates an engine-domain target time into a local steady
	/// clock fire time, computed once at post time.
	fn fire_time_for(&self, target_time_nanos: u64) -> Instant {
		let now = Instant::now();
		let delta = target_time_nanos as i64 - self.clock.now_nanos() as i64;
		if delta <= 0 {
			now
		} else {
			now + Duration::from_nanos(delta as u64)
		}
	}

	/// Blocks the owning thread until `max_wait` elapses, the next
	/// queued task comes due, or a post arrives, then runs everything
	/// that has expired. This is the native loop integration point.
	pub fn pump(&self, max_wait: Duration) {
		let Some(channel) = &self.channel else {
			return;
		};

		let timeout_ms = self.poll_timeout_ms(max_wait);
		let mut pfd = libc::pollfd {
			fd: channel.read_fd(),
			events: libc::POLLIN,
			revents: 0,
		};
		let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
		if rc < 0 {
			let err = std::io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				warn!("event loop poll failed: {err}");
			}
		} else if rc > 0 && (pfd.revents & libc::POLLIN) != 0 {
			match channel.drain() {
				Ok(records) => {
					for record in records {
						self.receive(record);
					}
				}
				Err(e) => warn!("event loop wakeup drain failed: {e}"),
			}
		}
		self.process_expired_tasks();
	}

	fn poll_timeout_ms(&self, max_wait: Duration) -> i32 {
		let next_delay = {
			let Ok(queue) = self.queue.lock() else {
				return 0;
			};
			queue
				.next_fire_time()
				.map(|t| t.saturating_duration_since(Instant::now()))
		};
		let wait = match next_delay {
			Some(delay) => delay.min(max_wait),
			None if max_wait == Duration::MAX => return -1,
			None => max_wait,
		};
		// Round up so the timer never wakes before the fire time.
		let millis = (wait.as_nanos() + 999_999) / 1_000_000;
		millis.min(i32::MAX as u128) as i32
	}

	/// Hands one record from the wakeup channel to the loop: tasks
	/// already past their fire time run immediately instead of taking
	/// a pointless trip through the queue.
	fn receive(&self, record: WireRecord) {
		let fire_time = self.epoch + Duration::from_nanos(record.fire_offset_nanos);
		let task = FlutterTask {
			runner: record.runner as *mut _,
			task: record.task,
		};
		if fire_time <= Instant::now() {
			self.dispatcher.dispatch(&[task]);
			return;
		}
		match self.queue.lock() {
			Ok(mut queue) => queue.push(TaskRecord {
				order: record.order,
				fire_time,
				task,
			}),
			Err(_) => warn!("task queue unavailable; dropping task"),
		}
	}

	/// Runs every queued task whose fire time has passed, in order,
	/// and returns the delay until the earliest remaining task.
	/// Owning thread only.
	pub fn process_expired_tasks(&self) -> Option<Duration> {
		let now = Instant::now();
		let mut expired = Vec::new();
		let next_fire_time;
		{
			let Ok(mut queue) = self.queue.lock() else {
				return None;
			};
			while let Some(record) = queue.pop_if_expired(now) {
				expired.push(record.task);
			}
			next_fire_time = queue.next_fire_time();
		}
		// Execution happens outside the lock so posters are never
		// blocked behind a running task.
		if !expired.is_empty() {
			self.dispatcher.dispatch(&expired);
		}
		next_fire_time.map(|t| t.saturating_duration_since(now))
	}

	/// True if there is nothing queued. Pending records still in the
	/// wakeup pipe are not visible here.
	pub fn is_idle(&self) -> bool {
		self.queue.lock().map(|queue| queue.is_empty()).unwrap_or(true)
	}
}
