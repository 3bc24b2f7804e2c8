use std::fmt;

use bootcheck_regs::{Register, RegisterUpdate, RegsError, parse_tagged_pairs};

use crate::{Result, TraceError};

/// Why a trace line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDefect {
    /// The line holds no fields at all.
    Empty,
    /// A field is not a valid `name:hexvalue` pair.
    Field(RegsError),
    /// The record does not set `pc`.
    MissingPc,
}

impl fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty record"),
            Self::Field(err) => write!(f, "{err}"),
            Self::MissingPc => write!(f, "record does not set pc"),
        }
    }
}

/// One line of the golden trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenRecord {
    /// 1-based line number in the trace.
    pub line: usize,
    /// Registers set by this record.
    pub update: RegisterUpdate,
}

impl GoldenRecord {
    /// Address of the instruction this record describes.
    #[must_use]
    pub fn pc(&self) -> u16 {
        // parse_record rejects records without pc
        self.update.get(Register::Pc).unwrap_or_default()
    }
}

/// Parse a single trace line.
pub fn parse_record(line: usize, text: &str) -> Result<GoldenRecord> {
    let malformed = |defect| TraceError::MalformedGoldenRecord { line, defect };

    if text.trim().is_empty() {
        return Err(malformed(RecordDefect::Empty));
    }

    let update = parse_tagged_pairs(text.split(',')).map_err(|e| malformed(RecordDefect::Field(e)))?;
    if update.get(Register::Pc).is_none() {
        return Err(malformed(RecordDefect::MissingPc));
    }

    Ok(GoldenRecord { line, update })
}
