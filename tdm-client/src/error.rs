use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdmError {
	#[error("failed to load tdm client library: {0}")]
	LoadLibrary(String),

	#[error("tdm symbol missing: {0}")]
	MissingSymbol(&'static str),

	#[error("tdm client creation failed (code {0})")]
	CreateClient(i32),

	#[error("tdm output lookup failed (code {0})")]
	GetOutput(i32),

	#[error("tdm vblank creation failed (code {0})")]
	CreateVblank(i32),

	#[error("tdm vblank wait failed (code {0})")]
	WaitVblank(i32),

	#[error("tdm event dispatch failed (code {0})")]
	HandleEvents(i32),
}
