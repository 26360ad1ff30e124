//! Runtime-loaded wrapper over the Tizen Display Manager client
//! library, plus the vblank source abstraction the vsync waiter
//! blocks on.

mod client;
mod error;
mod library;
mod source;

pub use client::TdmClient;
pub use error::TdmError;
pub use library::TdmLibrary;
pub use source::{FakeVblank, VblankInstant, VblankSource};
