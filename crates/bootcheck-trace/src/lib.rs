//! Golden register trace reader.
//!
//! A golden trace holds one record per line, each a comma separated list of
//! `name:hexvalue` fields:
//!
//! ```text
//! pc:0000,sp:0000
//! pc:0003,sp:fffe
//! pc:0004,af:0080
//! ```
//!
//! Records are incremental: a line only needs to list the registers that
//! changed since the previous one, but it must always carry `pc`, which is
//! where the checker places its breakpoint.
//!
//! Records are read lazily and in order. Leading records can be discarded
//! (`skip_count`) and the number of emitted records capped (`max_records`).

mod reader;
mod record;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use reader::{GoldenTraceReader, TraceSource, count_records};
pub use record::{GoldenRecord, RecordDefect, parse_record};

use thiserror::Error;

/// Golden trace errors.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("golden trace {} is unavailable: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed golden record at line {line}: {defect}")]
    MalformedGoldenRecord { line: usize, defect: RecordDefect },
    #[error("failed to read golden trace at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Which records of a trace are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceConfig {
    /// Leading records discarded before anything is emitted.
    pub skip_count: usize,
    /// Upper bound on emitted records (`None` = whole trace).
    pub max_records: Option<usize>,
}

impl TraceConfig {
    #[must_use]
    pub const fn new(skip_count: usize, max_records: Option<usize>) -> Self {
        Self {
            skip_count,
            max_records,
        }
    }

    /// Records emitted from a trace of `lines` lines.
    #[must_use]
    pub const fn window(&self, lines: usize) -> usize {
        let available = lines.saturating_sub(self.skip_count);
        match self.max_records {
            Some(max) if max < available => max,
            _ => available,
        }
    }
}
