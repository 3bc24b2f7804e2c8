use std::fmt;
use std::str::FromStr;

use crate::{NUM_REGISTERS, Register, RegsError, Result, parse_freeform_dump, parse_tagged_pairs};

/// Partial register update produced by the parsers.
///
/// Registers that were not mentioned by the source stay `None` and are left
/// untouched when the update is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterUpdate {
    values: [Option<u16>; NUM_REGISTERS],
}

impl RegisterUpdate {
    /// Create an empty update.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [None; NUM_REGISTERS],
        }
    }

    /// Record a value for `reg`, replacing any earlier one.
    pub const fn set(&mut self, reg: Register, value: u16) {
        self.values[reg.index()] = Some(value);
    }

    /// Value recorded for `reg`, if any.
    #[must_use]
    pub const fn get(&self, reg: Register) -> Option<u16> {
        self.values[reg.index()]
    }

    /// True if no register is touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Registers carried by this update, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        Register::ALL
            .into_iter()
            .filter_map(|reg| self.get(reg).map(|value| (reg, value)))
    }
}

/// The six register pairs of the CPU.
///
/// Two files are equal iff every pair matches exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterFile {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub sp: u16,
    pub pc: u16,
}

impl RegisterFile {
    /// All registers zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            af: 0,
            bc: 0,
            de: 0,
            hl: 0,
            sp: 0,
            pc: 0,
        }
    }

    #[must_use]
    pub const fn get(&self, reg: Register) -> u16 {
        match reg {
            Register::Af => self.af,
            Register::Bc => self.bc,
            Register::De => self.de,
            Register::Hl => self.hl,
            Register::Sp => self.sp,
            Register::Pc => self.pc,
        }
    }

    pub const fn set(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Af => self.af = value,
            Register::Bc => self.bc = value,
            Register::De => self.de = value,
            Register::Hl => self.hl = value,
            Register::Sp => self.sp = value,
            Register::Pc => self.pc = value,
        }
    }

    /// Look up a register by name.
    pub fn value_of(&self, name: &str) -> Result<u16> {
        name.parse::<Register>().map(|reg| self.get(reg))
    }

    /// Overwrite the registers carried by `update`, keep the rest.
    pub fn apply(&mut self, update: &RegisterUpdate) {
        for (reg, value) in update.iter() {
            self.set(reg, value);
        }
    }

    /// Merge `name:hexvalue` fields into this file.
    ///
    /// Unknown names are ignored. Nothing is written if any known field is
    /// malformed.
    pub fn update_from_tagged_pairs<'a, I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let update = parse_tagged_pairs(pairs)?;
        self.apply(&update);
        Ok(())
    }

    /// Merge a debugger register dump into this file.
    ///
    /// See [`parse_freeform_dump`] for which lines are accepted.
    pub fn update_from_freeform_dump(&mut self, text: &str) -> Result<()> {
        let update = parse_freeform_dump(text)?;
        self.apply(&update);
        Ok(())
    }

    /// Registers whose values differ between `self` and `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<Register> {
        Register::ALL
            .into_iter()
            .filter(|&reg| self.get(reg) != other.get(reg))
            .collect()
    }

    /// Render as `af:0x01b0 bc:0x0013 ...`, the same text as `Display`.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, reg) in Register::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:0x{:04x}", reg.name(), self.get(reg))?;
        }
        Ok(())
    }
}

/// Parses the `Display` form (space separated `name:hexvalue` fields).
impl FromStr for RegisterFile {
    type Err = RegsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut regs = Self::new();
        regs.update_from_tagged_pairs(s.split_whitespace())?;
        Ok(regs)
    }
}
