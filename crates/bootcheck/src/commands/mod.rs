//! Command implementations.

mod check;
mod validate;

use std::path::PathBuf;

use bootcheck::TraceConfig;
use bootcheck::preset::{self, Overrides};

use crate::cli::{Cli, Commands, TraceArgs};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Check { .. } => handle_check(cli),
        Commands::Validate { trace } => validate::cmd_validate(trace),
    }
}

fn handle_check(cli: &Cli) -> i32 {
    let Commands::Check {
        trace,
        endpoint,
        arch,
        timeout_secs,
    } = &cli.command
    else {
        unreachable!("check command variant mismatch");
    };

    check::cmd_check(trace, endpoint, arch, *timeout_secs)
}

/// Trace file and record window from `--preset` and explicit flags.
fn resolve_trace(args: &TraceArgs) -> Option<(PathBuf, TraceConfig)> {
    preset::resolve(
        args.preset.map(Into::into),
        Overrides {
            trace_path: args.trace.clone(),
            skip_count: args.skip,
            max_records: args.max_records,
        },
    )
}
