use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Mutex;

use crate::error::LoopError;

pub(crate) const RECORD_SIZE: usize = 32;

/// Fixed-size task record as it travels through the wakeup pipe.
/// Fire time is carried as an offset from the owning loop's epoch so
/// the record is plain bytes end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WireRecord {
	pub order: u64,
	pub fire_offset_nanos: u64,
	pub runner: u64,
	pub task: u64,
}

impl WireRecord {
	pub fn encode(&self) -> [u8; RECORD_SIZE] {
		let mut buf = [0u8; RECORD_SIZE];
		buf[0..8].copy_from_slice(&self.order.to_le_bytes());
		buf[8..16].copy_from_slice(&self.fire_offset_nanos.to_le_bytes());
		buf[16..24].copy_from_slice(&self.runner.to_le_bytes());
		buf[24..32].copy_from_slice(&self.task.to_le_bytes());
		buf
	}

	pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
		let field = |range: std::ops::Range<usize>| {
			let mut bytes = [0u8; 8];
			bytes.copy_from_slice(&buf[range]);
			u64::from_le_bytes(bytes)
		};
		Self {
			order: field(0..8),
			fire_offset_nanos: field(8..16),
			runner: field(16..24),
			task: field(24..32),
		}
	}
}

/// Byte pipe that lets any thread hand a task record to the loop's
/// owning thread and wake its native wait in the same step.
///
/// Records are smaller than `PIPE_BUF`, so concurrent writers never
/// interleave and FIFO-per-sender ordering is the pipe's own
/// guarantee.
pub(crate) struct WakeupChannel {
	read_fd: OwnedFd,
	write_fd: OwnedFd,
	// Reassembles records if a read ever lands mid-record. Only the
	// owning thread locks this.
	carry: Mutex<Vec<u8>>,
}

impl WakeupChannel {
	pub fn new() -> Result<Self, LoopError> {
		let mut fds = [0i32; 2];
		let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
		if rc < 0 {
			return Err(LoopError::WakeupChannel(io::Error::last_os_error()));
		}
		let read_fd = unsafe { OwnedFd::from_raw_fd(fds[0]) };
		let write_fd = unsafe { OwnedFd::from_raw_fd(fds[1]) };

		// Nonblocking reads let the owner drain everything available
		// without a final blocking read.
		let flags = unsafe { libc::fcntl(read_fd.as_raw_fd(), libc::F_GETFL) };
		if flags < 0
			|| unsafe {
				libc::fcntl(read_fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK)
			} < 0
		{
			return Err(LoopError::WakeupChannel(io::Error::last_os_error()));
		}

		Ok(Self {
			read_fd,
			write_fd,
			carry: Mutex::new(Vec::new()),
		})
	}

	pub fn read_fd(&self) -> RawFd {
		self.read_fd.as_raw_fd()
	}

	/// Writes one record; safe to call from any number of threads.
	pub fn send(&self, record: &WireRecord) -> Result<(), LoopError> {
		let buf = record.encode();
		loop {
			let n = unsafe {
				libc::write(self.write_fd.as_raw_fd(), buf.as_ptr().cast(), buf.len())
			};
			if n == buf.len() as isize {
				return Ok(());
			}
			if n < 0 {
				let err = io::Error::last_os_error();
				if err.raw_os_error() == Some(libc::EINTR) {
					continue;
				}
				return Err(LoopError::Send(err));
			}
			return Err(LoopError::ShortWrite(n as usize));
		}
	}

	/// Reads every record currently in the pipe. Owning thread only.
	pub fn drain(&self) -> Result<Vec<WireRecord>, LoopError> {
		let mut records = Vec::new();
		let Ok(mut carry) = self.carry.lock() else {
			return Ok(records);
		};
		let mut buf = [0u8; 8 * RECORD_SIZE];
		loop {
			let n = unsafe {
				libc::read(self.read_fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len())
			};
			if n < 0 {
				let err = io::Error::last_os_error();
				match err.raw_os_error() {
					Some(libc::EINTR) => continue,
					Some(libc::EAGAIN) => break,
					_ => return Err(LoopError::Drain(err)),
				}
			}
			if n == 0 {
				break;
			}
			carry.extend_from_slice(&buf[..n as usize]);
		}
		while carry.len() >= RECORD_SIZE {
			let mut chunk = [0u8; RECORD_SIZE];
			chunk.copy_from_slice(&carry[..RECORD_SIZE]);
			records.push(WireRecord::decode(&chunk));
			carry.drain(..RECORD_SIZE);
		}
		Ok(records)
	}
}

#[cfg(test)]
mod tests {
	use super::{WakeupChannel, WireRecord};
	use std::collections::HashSet;
	use std::sync::Arc;
	use std::thread;
	use std::time::{Duration, Instant};

	#[test]
	fn concurrent_senders_deliver_whole_records() {
		let channel = Arc::new(WakeupChannel::new().unwrap());
		let senders = 8u64;
		let per_sender = 100u64;

		let handles: Vec<_> = (0..senders)
			.map(|s| {
				let channel = Arc::clone(&channel);
				thread::spawn(move || {
					for i in 0..per_sender {
						let order = s * per_sender + i;
						channel
							.send(&WireRecord {
								order,
								fire_offset_nanos: order * 10,
								runner: 0,
								task: order,
							})
							.unwrap();
					}
				})
			})
			.collect();

		let mut seen = HashSet::new();
		let deadline = Instant::now() + Duration::from_secs(5);
		while seen.len() < (senders * per_sender) as usize {
			assert!(Instant::now() < deadline, "lost wakeup records");
			for record in channel.drain().unwrap() {
				assert_eq!(record.task, record.order);
				assert_eq!(record.fire_offset_nanos, record.order * 10);
				assert!(seen.insert(record.order), "duplicate record");
			}
			thread::sleep(Duration::from_millis(1));
		}
		for handle in handles {
			handle.join().unwrap();
		}
	}

	#[test]
	fn sender_order_is_preserved() {
		let channel = WakeupChannel::new().unwrap();
		for order in 0..10 {
			channel
				.send(&WireRecord {
					order,
					fire_offset_nanos: 0,
					runner: 0,
					task: order,
				})
				.unwrap();
		}
		let orders: Vec<u64> = channel.drain().unwrap().iter().map(|r| r.order).collect();
		assert_eq!(orders, (0..10).collect::<Vec<u64>>());
	}
}
