use bootcheck_regs::RegsError;
use bootcheck_trace::TraceError;
use thiserror::Error;

use crate::session::SessionError;

/// Checker errors. A register mismatch is not an error, see
/// [`CheckOutcome`](crate::checker::CheckOutcome).
#[derive(Error, Debug)]
pub enum Error {
    #[error("golden trace error: {0}")]
    Trace(#[from] TraceError),
    #[error("debug session error: {0}")]
    Session(#[from] SessionError),
    #[error("register dump error: {0}")]
    Regs(#[from] RegsError),
}

pub type Result<T> = std::result::Result<T, Error>;
