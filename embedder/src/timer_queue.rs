use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use flutter_engine_abi::FlutterTask;

/// One pending unit of engine work, keyed for ordered execution.
pub(crate) struct TaskRecord {
	pub order: u64,
	pub fire_time: Instant,
	pub task: FlutterTask,
}

struct HeapEntry(TaskRecord);

impl PartialEq for HeapEntry {
	fn eq(&self, other: &Self) -> bool {
		self.0.fire_time == other.0.fire_time && self.0.order == other.0.order
	}
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		// BinaryHeap is a max-heap; reverse the key so the earliest
		// (fire_time, order) pair surfaces first.
		(other.0.fire_time, other.0.order).cmp(&(self.0.fire_time, self.0.order))
	}
}

impl PartialOrd for HeapEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Pending tasks ordered by fire time, ties broken by insertion order.
/// Holds only not-yet-executed tasks; a popped task is never
/// reinserted.
pub(crate) struct TimerQueue {
	heap: BinaryHeap<HeapEntry>,
}

impl TimerQueue {
	pub fn new() -> Self {
		Self {
			heap: BinaryHeap::new(),
		}
	}

	pub fn push(&mut self, record: TaskRecord) {
		self.heap.push(HeapEntry(record));
	}

	/// Fire time of the earliest pending task, if any.
	pub fn next_fire_time(&self) -> Option<Instant> {
		self.heap.peek().map(|entry| entry.0.fire_time)
	}

	/// Pops the earliest task only if it is due at `now`.
	pub fn pop_if_expired(&mut self, now: Instant) -> Option<TaskRecord> {
		if self.heap.peek()?.0.fire_time > now {
			return None;
		}
		self.heap.pop().map(|entry| entry.0)
	}

	pub fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::{TaskRecord, TimerQueue};
	use std::time::{Duration, Instant};

	fn record(order: u64, fire_time: Instant, id: u64) -> TaskRecord {
		TaskRecord {
			order,
			fire_time,
			task: flutter_engine_abi::FlutterTask {
				runner: std::ptr::null_mut(),
				task: id,
			},
		}
	}

	#[test]
	fn pops_in_fire_time_order() {
		let base = Instant::now();
		let mut queue = TimerQueue::new();
		queue.push(record(1, base + Duration::from_millis(5), 10));
		queue.push(record(2, base + Duration::from_millis(1), 20));
		queue.push(record(3, base + Duration::from_millis(3), 30));

		let late = base + Duration::from_millis(10);
		assert_eq!(queue.pop_if_expired(late).unwrap().task.task, 20);
		assert_eq!(queue.pop_if_expired(late).unwrap().task.task, 30);
		assert_eq!(queue.pop_if_expired(late).unwrap().task.task, 10);
		assert!(queue.pop_if_expired(late).is_none());
	}

	#[test]
	fn equal_fire_times_break_ties_by_insertion_order() {
		let base = Instant::now();
		let fire = base + Duration::from_millis(1);
		let mut queue = TimerQueue::new();
		queue.push(record(7, fire, 70));
		queue.push(record(5, fire, 50));
		queue.push(record(6, fire, 60));

		let late = base + Duration::from_millis(2);
		assert_eq!(queue.pop_if_expired(late).unwrap().order, 5);
		assert_eq!(queue.pop_if_expired(late).unwrap().order, 6);
		assert_eq!(queue.pop_if_expired(late).unwrap().order, 7);
	}

	#[test]
	fn unexpired_tasks_stay_queued() {
		let base = Instant::now();
		let mut queue = TimerQueue::new();
		queue.push(record(1, base + Duration::from_secs(60), 1));

		assert!(queue.pop_if_expired(base).is_none());
		assert!(!queue.is_empty());
		assert_eq!(queue.next_fire_time(), Some(base + Duration::from_secs(60)));
	}

	#[test]
	fn exact_deadline_counts_as_expired() {
		let base = Instant::now();
		let mut queue = TimerQueue::new();
		queue.push(record(1, base, 1));
		assert!(queue.pop_if_expired(base).is_some());
	}
}
