use std::os::raw::{c_char, c_uint, c_void};

use crate::error::TdmError;

pub(crate) const TDM_ERROR_NONE: i32 = 0;

/// Opaque `tdm_client` handle.
#[repr(C)]
pub struct RawClient {
	_private: [u8; 0],
}

/// Opaque `tdm_client_output` handle.
#[repr(C)]
pub struct RawOutput {
	_private: [u8; 0],
}

/// Opaque `tdm_client_vblank` handle.
#[repr(C)]
pub struct RawVblank {
	_private: [u8; 0],
}

/// `tdm_client_vblank_handler` shape. Timestamps arrive split into
/// seconds and microseconds of the hardware vblank.
pub(crate) type VblankHandler = unsafe extern "C" fn(
	vblank: *mut RawVblank,
	error: i32,
	sequence: c_uint,
	tv_sec: c_uint,
	tv_usec: c_uint,
	user_data: *mut c_void,
);

type ClientCreateFn = unsafe extern "C" fn(*mut i32) -> *mut RawClient;
type ClientDestroyFn = unsafe extern "C" fn(*mut RawClient);
type GetOutputFn = unsafe extern "C" fn(*mut RawClient, *const c_char, *mut i32) -> *mut RawOutput;
type OutputCreateVblankFn = unsafe extern "C" fn(*mut RawOutput, *mut i32) -> *mut RawVblank;
type VblankDestroyFn = unsafe extern "C" fn(*mut RawVblank);
type VblankSetEnableFakeFn = unsafe extern "C" fn(*mut RawVblank, c_uint) -> i32;
type VblankWaitFn =
	unsafe extern "C" fn(*mut RawVblank, c_uint, VblankHandler, *mut c_void) -> i32;
type HandleEventsFn = unsafe extern "C" fn(*mut RawClient) -> i32;

/// `libtdm-client` entry points resolved at runtime, so binaries stay
/// loadable on hosts without the Tizen display stack.
pub struct TdmLibrary {
	pub(crate) client_create: ClientCreateFn,
	pub(crate) client_destroy: ClientDestroyFn,
	pub(crate) get_output: GetOutputFn,
	pub(crate) output_create_vblank: OutputCreateVblankFn,
	pub(crate) vblank_destroy: VblankDestroyFn,
	pub(crate) vblank_set_enable_fake: VblankSetEnableFakeFn,
	pub(crate) vblank_wait: VblankWaitFn,
	pub(crate) handle_events: HandleEventsFn,
	_lib: libloading::Library,
}

impl TdmLibrary {
	pub fn open() -> Result<Self, TdmError> {
		Self::open_at("libtdm-client.so.2")
	}

	pub fn open_at(path: &str) -> Result<Self, TdmError> {
		let lib = unsafe { libloading::Library::new(path) }
			.map_err(|e| TdmError::LoadLibrary(e.to_string()))?;
		Ok(Self {
			client_create: load_fn(&lib, b"tdm_client_create\0", "tdm_client_create")?,
			client_destroy: load_fn(&lib, b"tdm_client_destroy\0", "tdm_client_destroy")?,
			get_output: load_fn(&lib, b"tdm_client_get_output\0", "tdm_client_get_output")?,
			output_create_vblank: load_fn(
				&lib,
				b"tdm_client_output_create_vblank\0",
				"tdm_client_output_create_vblank",
			)?,
			vblank_destroy: load_fn(
				&lib,
				b"tdm_client_vblank_destroy\0",
				"tdm_client_vblank_destroy",
			)?,
			vblank_set_enable_fake: load_fn(
				&lib,
				b"tdm_client_vblank_set_enable_fake\0",
				"tdm_client_vblank_set_enable_fake",
			)?,
			vblank_wait: load_fn(&lib, b"tdm_client_vblank_wait\0", "tdm_client_vblank_wait")?,
			handle_events: load_fn(&lib, b"tdm_client_handle_events\0", "tdm_client_handle_events")?,
			_lib: lib,
		})
	}
}

fn load_fn<T: Copy>(
	lib: &libloading::Library,
	symbol: &[u8],
	name: &'static str,
) -> Result<T, TdmError> {
	let sym = unsafe { lib.get::<T>(symbol) }.map_err(|_| TdmError::MissingSymbol(name))?;
	Ok(*sym)
}
