//! Debug session abstraction.
//!
//! The checker only needs a handful of operations from a debugger: attach to
//! a remote target, run to an address, and dump registers. [`DebugSession`]
//! captures exactly that so the comparison loop can be driven by the GDB
//! remote client in [`crate::gdb`] or by a scripted session in tests.

use std::time::Duration;

use thiserror::Error;

/// Default remote stub endpoint of the emulator.
pub const DEFAULT_ENDPOINT: &str = "localhost:1337";

/// Default target architecture id.
pub const DEFAULT_ARCHITECTURE: &str = "gbz80";

/// Debug session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("not attached to a target")]
    NotAttached,

    #[error("unsupported target architecture '{0}'")]
    UnsupportedArchitecture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("target rejected '{command}' with '{reply}'")]
    Rejected { command: String, reply: String },

    #[error("target exited with status {0}")]
    TargetExited(u8),

    #[error("target terminated by signal {0}")]
    TargetTerminated(u8),

    #[error("breakpoint not reached within {0:?}")]
    Timeout(Duration),
}

/// Session settings applied before attaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interactive pagination; the checker always turns it off.
    pub pagination: bool,
    /// Target architecture id (e.g. `gbz80`).
    pub architecture: String,
    /// Upper bound on a single resume. `None` waits forever.
    pub resume_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pagination: false,
            architecture: DEFAULT_ARCHITECTURE.to_string(),
            resume_timeout: None,
        }
    }
}

/// Operations the checker needs from a debugger attached to the emulator.
pub trait DebugSession {
    /// Apply session settings. Called once, before [`DebugSession::attach`].
    fn configure(&mut self, config: &SessionConfig) -> Result<(), SessionError>;

    /// Attach to the remote target at `host:port`.
    fn attach(&mut self, endpoint: &str) -> Result<(), SessionError>;

    /// Place a breakpoint that is removed once it triggers.
    fn set_temporary_breakpoint(&mut self, address: u16) -> Result<(), SessionError>;

    /// Continue until a breakpoint triggers.
    ///
    /// Target exit or termination is an error.
    fn resume(&mut self) -> Result<(), SessionError>;

    /// Current register state as free-form text, one register per line.
    fn dump_registers(&mut self) -> Result<String, SessionError>;

    /// Detach from the target and close the session.
    fn disconnect(&mut self) -> Result<(), SessionError>;
}

impl<S: DebugSession + ?Sized> DebugSession for &mut S {
    fn configure(&mut self, config: &SessionConfig) -> Result<(), SessionError> {
        (**self).configure(config)
    }

    fn attach(&mut self, endpoint: &str) -> Result<(), SessionError> {
        (**self).attach(endpoint)
    }

    fn set_temporary_breakpoint(&mut self, address: u16) -> Result<(), SessionError> {
        (**self).set_temporary_breakpoint(address)
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        (**self).resume()
    }

    fn dump_registers(&mut self) -> Result<String, SessionError> {
        (**self).dump_registers()
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        (**self).disconnect()
    }
}
