//! `bootcheck validate`: parse a golden trace offline.

use bootcheck::{GoldenTraceReader, RegisterFile};

use super::resolve_trace;
use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, TraceArgs};
use crate::terminal::{self, Spinner};

pub fn cmd_validate(trace: &TraceArgs) -> i32 {
    let Some((trace_path, trace_config)) = resolve_trace(trace) else {
        terminal::error("no trace file given (use --trace or --preset)");
        return EXIT_FAILURE;
    };

    let records = match GoldenTraceReader::open(&trace_path, trace_config) {
        Ok(records) => records,
        Err(err) => {
            terminal::error(&err.to_string());
            return EXIT_FAILURE;
        }
    };

    let spinner = Spinner::new(format!("Validating {}", trace_path.display()));
    let mut golden = RegisterFile::new();
    let mut count = 0usize;
    for record in records {
        match record {
            Ok(record) => {
                golden.apply(&record.update);
                count += 1;
            }
            Err(err) => {
                spinner.finish_with_failure(&err.to_string());
                return EXIT_FAILURE;
            }
        }
    }

    spinner.finish_with_success(&format!("{count} records valid"));
    if count > 0 {
        terminal::dim(&format!("final state: {golden}"));
    }
    EXIT_SUCCESS
}
