use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use tracing::{debug, trace};

use crate::{GoldenRecord, Result, TraceConfig, TraceError, parse_record};

/// Byte source of a trace opened from disk.
pub type TraceSource = Box<dyn BufRead>;

/// Lazy, forward-only reader over golden records.
///
/// Yields `Err` at most once: after a malformed or unreadable line the
/// reader is exhausted.
pub struct GoldenTraceReader<R> {
    lines: Lines<R>,
    config: TraceConfig,
    line: usize,
    skipped: usize,
    emitted: usize,
    finished: bool,
}

/// Open the byte source of a trace file, decompressing `.zst` files.
fn open_source(path: &Path) -> Result<TraceSource> {
    let unavailable = |source| TraceError::ResourceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    // Opening a directory succeeds on Unix.
    if file.metadata().map_err(unavailable)?.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::IsADirectory,
            "trace path is a directory",
        )));
    }
    if path.extension().is_some_and(|ext| ext == "zst") {
        let decoder = zstd::stream::read::Decoder::new(file).map_err(unavailable)?;
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Number of records a reader over `path` emits if every line parses.
///
/// Only counts lines, nothing is parsed.
pub fn count_records(path: &Path, config: TraceConfig) -> Result<usize> {
    let mut lines = 0;
    for line in open_source(path)?.lines() {
        line.map_err(|source| TraceError::Read {
            line: lines + 1,
            source,
        })?;
        lines += 1;
    }
    Ok(config.window(lines))
}

impl GoldenTraceReader<TraceSource> {
    /// Open a trace file. Files ending in `.zst` are decompressed on the fly.
    pub fn open(path: &Path, config: TraceConfig) -> Result<Self> {
        let source = open_source(path)?;
        debug!(path = %path.display(), skip = config.skip_count, max = ?config.max_records, "opened golden trace");
        Ok(Self::from_reader(source, config))
    }
}

impl<R: BufRead> GoldenTraceReader<R> {
    /// Read records from any buffered source.
    pub fn from_reader(reader: R, config: TraceConfig) -> Self {
        Self {
            lines: reader.lines(),
            config,
            line: 0,
            skipped: 0,
            emitted: 0,
            finished: false,
        }
    }

    /// Number of records emitted so far.
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    /// Current 1-based line number (0 before the first read).
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Produce the next record, or `None` at the end of the trace.
    pub fn next_record(&mut self) -> Option<Result<GoldenRecord>> {
        if self.finished {
            return None;
        }
        if self.config.max_records.is_some_and(|max| self.emitted >= max) {
            debug!(records = self.emitted, "record limit reached");
            self.finished = true;
            return None;
        }

        // Skipped lines may be headers, so they are not parsed.
        while self.skipped < self.config.skip_count {
            if let Err(err) = self.next_line()? {
                return self.fail(err);
            }
            self.skipped += 1;
            trace!(line = self.line, "skipped leading record");
        }

        let text = match self.next_line()? {
            Ok(text) => text,
            Err(err) => return self.fail(err),
        };

        match parse_record(self.line, &text) {
            Ok(record) => {
                self.emitted += 1;
                Some(Ok(record))
            }
            Err(err) => self.fail(err),
        }
    }

    fn next_line(&mut self) -> Option<Result<String>> {
        let next = self.lines.next();
        let Some(next) = next else {
            self.finished = true;
            return None;
        };
        self.line += 1;
        let line = self.line;
        Some(next.map_err(|source| TraceError::Read { line, source }))
    }

    fn fail(&mut self, err: TraceError) -> Option<Result<GoldenRecord>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for GoldenTraceReader<R> {
    type Item = Result<GoldenRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}
