//! Register model for the Game Boy CPU (SM83).
//!
//! The checker only looks at the six 16-bit register pairs. A [`RegisterFile`]
//! can be filled from two textual encodings:
//!
//! - golden trace fields (`af:01b0`, see [`parse_tagged_pairs`])
//! - debugger register dumps (`af   0x1b0   432`, see [`parse_freeform_dump`])
//!
//! Both parsers produce a [`RegisterUpdate`], a partial update that only
//! touches the registers it mentions.
//!
//! ```
//! use bootcheck_regs::{Register, RegisterFile};
//!
//! let mut regs = RegisterFile::new();
//! regs.update_from_tagged_pairs(["pc:0x0100", "af:01b0"]).unwrap();
//! assert_eq!(regs.get(Register::Pc), 0x0100);
//! assert_eq!(regs.to_string(), "af:0x01b0 bc:0x0000 de:0x0000 hl:0x0000 sp:0x0000 pc:0x0100");
//! ```

mod file;
mod hex;
mod register;
mod sample;
mod tagged;

pub use file::{RegisterFile, RegisterUpdate};
pub use hex::parse_hex;
pub use register::{NUM_REGISTERS, Register};
pub use sample::parse_freeform_dump;
pub use tagged::{parse_tagged_pair, parse_tagged_pairs};

use thiserror::Error;

/// Register parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegsError {
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("malformed field '{0}' (expected name:hexvalue)")]
    MalformedPair(String),
    #[error("invalid hex value '{0}'")]
    InvalidHex(String),
    #[error("value '{0}' does not fit in 16 bits")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, RegsError>;
