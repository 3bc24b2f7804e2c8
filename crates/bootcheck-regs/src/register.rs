use std::fmt;
use std::str::FromStr;

use crate::RegsError;

/// Number of register pairs tracked by the checker.
pub const NUM_REGISTERS: usize = 6;

/// A 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    Af,
    Bc,
    De,
    Hl,
    Sp,
    Pc,
}

impl Register {
    /// All registers in display order.
    pub const ALL: [Self; NUM_REGISTERS] = [
        Self::Af,
        Self::Bc,
        Self::De,
        Self::Hl,
        Self::Sp,
        Self::Pc,
    ];

    /// Lowercase name as used by traces and GDB.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Af => "af",
            Self::Bc => "bc",
            Self::De => "de",
            Self::Hl => "hl",
            Self::Sp => "sp",
            Self::Pc => "pc",
        }
    }

    /// Position in [`Register::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a register by its exact (lowercase) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reg| reg.name() == name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = RegsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| RegsError::UnknownRegister(s.to_string()))
    }
}
