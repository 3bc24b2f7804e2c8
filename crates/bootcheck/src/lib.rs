//! bootcheck - differential boot trace checker
//!
//! Attaches to an emulator's GDB stub, runs the boot ROM instruction by
//! instruction and compares the CPU registers against a golden trace.
//!
//! # Example
//!
//! ```ignore
//! use bootcheck::{CheckConfig, GdbSession, check};
//!
//! let config = CheckConfig::new("tests/golden_files/boot_states.txt");
//! let outcome = check(GdbSession::new(), &config)?;
//! std::process::exit(outcome.exit_code());
//! ```

// Re-export from sub-crates
pub use bootcheck_regs::{Register, RegisterFile, RegisterUpdate, RegsError};
pub use bootcheck_trace::{
    GoldenRecord, GoldenTraceReader, RecordDefect, TraceConfig, TraceError, count_records,
};

pub mod checker;
mod error;
pub mod gdb;
pub mod metrics;
pub mod preset;
pub mod session;

pub use checker::{CheckConfig, CheckOutcome, LoopState, Mismatch, Phase, TraceChecker, check};
pub use error::{Error, Result};
pub use gdb::GdbSession;
pub use preset::Preset;
pub use session::{DebugSession, SessionConfig, SessionError};
