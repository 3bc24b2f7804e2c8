//! `bootcheck check`: run the emulator against the golden trace.

use std::time::Duration;

use bootcheck::{CheckConfig, CheckOutcome, GdbSession, SessionConfig, TraceChecker, count_records};

use super::resolve_trace;
use crate::cli::{EXIT_FAILURE, TraceArgs};
use crate::terminal::{self, StepProgress};

pub fn cmd_check(trace: &TraceArgs, endpoint: &str, arch: &str, timeout_secs: Option<u64>) -> i32 {
    let Some((trace_path, trace_config)) = resolve_trace(trace) else {
        terminal::error("no trace file given (use --trace or --preset)");
        return EXIT_FAILURE;
    };

    let config = CheckConfig {
        trace: trace_config,
        endpoint: endpoint.to_string(),
        session: SessionConfig {
            architecture: arch.to_string(),
            resume_timeout: timeout_secs.map(Duration::from_secs),
            ..SessionConfig::default()
        },
        ..CheckConfig::new(trace_path)
    };
    terminal::info(&format!(
        "Checking {} (skip {}, {})",
        config.trace_path.display(),
        config.trace.skip_count,
        config
            .trace
            .max_records
            .map_or_else(|| "all records".to_string(), |n| format!("at most {n} records")),
    ));

    // The check reports an unreadable trace itself; the bar just falls back to a spinner.
    let total = count_records(&config.trace_path, config.trace).ok().map(|n| n as u64);
    let progress = StepProgress::attaching(endpoint, total);
    let hook = progress.clone();
    let mut checker = TraceChecker::new(GdbSession::new()).on_step(move |step, pc| hook.step(step, pc));
    let result = checker.check(&config);
    progress.finish();

    match result {
        Ok(outcome @ CheckOutcome::Passed { compared }) => {
            terminal::success(&format!("{compared} records match the golden trace"));
            outcome.exit_code()
        }
        Ok(CheckOutcome::Failed(mismatch)) => {
            let registers: Vec<_> = mismatch.registers().iter().map(|r| r.name()).collect();
            terminal::error(&format!(
                "mismatch at step {} (trace line {}): {}",
                mismatch.step,
                mismatch.line,
                registers.join(", ")
            ));
            println!("{mismatch}");
            CheckOutcome::Failed(mismatch).exit_code()
        }
        Err(err) => {
            terminal::error(&format!("check failed: {err}"));
            EXIT_FAILURE
        }
    }
}
