use std::os::raw::{c_uint, c_void};

use tracing::debug;

use crate::error::TdmError;
use crate::library::{RawClient, RawOutput, RawVblank, TDM_ERROR_NONE, TdmLibrary};
use crate::source::{VblankInstant, VblankSource};

const OUTPUT_NAME: &[u8] = b"default\0";

/// Live connection to the display server's vblank service.
///
/// Creation is strictly ordered (client, then output, then vblank);
/// teardown runs in reverse. The output handle is borrowed from the
/// client and has no destroy call of its own.
pub struct TdmClient {
	lib: TdmLibrary,
	client: *mut RawClient,
	output: *mut RawOutput,
	vblank: *mut RawVblank,
}

// The connection is created on the vsync worker thread and only ever
// touched there; `Send` covers the move into that thread.
unsafe impl Send for TdmClient {}

impl TdmClient {
	pub fn connect(lib: TdmLibrary) -> Result<Self, TdmError> {
		let mut error = TDM_ERROR_NONE;
		let client = unsafe { (lib.client_create)(&mut error) };
		if error != TDM_ERROR_NONE || client.is_null() {
			return Err(TdmError::CreateClient(error));
		}

		let output =
			unsafe { (lib.get_output)(client, OUTPUT_NAME.as_ptr().cast(), &mut error) };
		if error != TDM_ERROR_NONE || output.is_null() {
			unsafe { (lib.client_destroy)(client) };
			return Err(TdmError::GetOutput(error));
		}

		let vblank = unsafe { (lib.output_create_vblank)(output, &mut error) };
		if error != TDM_ERROR_NONE || vblank.is_null() {
			unsafe { (lib.client_destroy)(client) };
			return Err(TdmError::CreateVblank(error));
		}

		// Fall back to timer-driven vblanks when the output is off,
		// so waits stay bounded.
		unsafe { (lib.vblank_set_enable_fake)(vblank, 1) };

		debug!("tdm client connected");
		Ok(Self {
			lib,
			client,
			output,
			vblank,
		})
	}

	/// Registers a single vblank wait and pumps display-service events
	/// until its callback fires.
	fn wait_vblank(&mut self, interval: c_uint) -> Result<VblankInstant, TdmError> {
		let mut slot: Option<Result<VblankInstant, i32>> = None;
		let error = unsafe {
			(self.lib.vblank_wait)(
				self.vblank,
				interval,
				vblank_trampoline,
				(&mut slot as *mut Option<Result<VblankInstant, i32>>).cast(),
			)
		};
		if error != TDM_ERROR_NONE {
			return Err(TdmError::WaitVblank(error));
		}
		loop {
			let error = unsafe { (self.lib.handle_events)(self.client) };
			if error != TDM_ERROR_NONE {
				return Err(TdmError::HandleEvents(error));
			}
			match slot.take() {
				Some(Ok(instant)) => return Ok(instant),
				Some(Err(code)) => return Err(TdmError::WaitVblank(code)),
				None => continue,
			}
		}
	}
}

impl VblankSource for TdmClient {
	fn wait_for_vblank(&mut self) -> Result<VblankInstant, TdmError> {
		self.wait_vblank(1)
	}
}

impl Drop for TdmClient {
	fn drop(&mut self) {
		// Reverse creation order; the output reference goes away with
		// the client.
		unsafe { (self.lib.vblank_destroy)(self.vblank) };
		self.output = std::ptr::null_mut();
		unsafe { (self.lib.client_destroy)(self.client) };
		debug!("tdm client destroyed");
	}
}

unsafe extern "C" fn vblank_trampoline(
	_vblank: *mut RawVblank,
	error: i32,
	_sequence: c_uint,
	tv_sec: c_uint,
	tv_usec: c_uint,
	user_data: *mut c_void,
) {
	let slot = unsafe { &mut *user_data.cast::<Option<Result<VblankInstant, i32>>>() };
	*slot = Some(if error == TDM_ERROR_NONE {
		Ok(VblankInstant { tv_sec, tv_usec })
	} else {
		Err(error)
	});
}
