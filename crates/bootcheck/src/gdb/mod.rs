//! GDB Remote Serial Protocol client.
//!
//! Connects straight to the emulator's debug stub and implements
//! [`DebugSession`](crate::session::DebugSession) on top of a handful of
//! packets: `qSupported`, `?`, `qAttached`, `Z1`/`z1`, `c`, `g` and `D`.
//!
//! # Usage
//!
//! ```ignore
//! use bootcheck::gdb::GdbSession;
//! use bootcheck::session::{DebugSession, SessionConfig};
//!
//! let mut session = GdbSession::new();
//! session.configure(&SessionConfig::default())?;
//! session.attach("localhost:1337")?;
//! session.set_temporary_breakpoint(0x0100)?;
//! session.resume()?;
//! println!("{}", session.dump_registers()?);
//! ```

mod client;
pub mod packet;

pub use client::{GdbSession, StopReply, decode_registers, format_registers};
