use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
	#[error("wakeup channel creation failed: {0}")]
	WakeupChannel(std::io::Error),

	#[error("wakeup pipe write failed: {0}")]
	Send(std::io::Error),

	#[error("wakeup pipe read failed: {0}")]
	Drain(std::io::Error),

	#[error("short wakeup pipe write ({0} bytes)")]
	ShortWrite(usize),
}
