use thiserror::Error;

use crate::sys::FlutterEngineResult;

#[derive(Debug, Error)]
pub enum AbiError {
	#[error("failed to load engine library: {0}")]
	LoadEngineLibrary(String),

	#[error("engine symbol missing: {0}")]
	MissingSymbol(&'static str),

	#[error("{call} returned {code:?}")]
	EngineCall {
		call: &'static str,
		code: FlutterEngineResult,
	},
}
