//! CLI definitions and argument types.

use std::path::PathBuf;

use bootcheck::Preset;
use bootcheck::session::{DEFAULT_ARCHITECTURE, DEFAULT_ENDPOINT};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "bootcheck")]
#[command(about = "Check an emulator's boot sequence against a golden register trace")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive for the selected verbosity.
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "bootcheck=debug"
        } else if self.silent {
            "bootcheck=error"
        } else {
            "bootcheck=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attach to the emulator's GDB stub and compare registers step by step
    Check {
        #[command(flatten)]
        trace: TraceArgs,

        /// Remote stub address
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Target architecture id
        #[arg(long, default_value = DEFAULT_ARCHITECTURE)]
        arch: String,

        /// Give up if a resume does not hit its breakpoint within this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
    },
    /// Parse a golden trace without attaching to a target
    Validate {
        #[command(flatten)]
        trace: TraceArgs,
    },
}

/// Which trace to read and which part of it.
#[derive(Args, Debug, Clone)]
pub struct TraceArgs {
    /// Golden trace file (`.zst` is decompressed)
    #[arg(short, long, value_name = "FILE", required_unless_present = "preset")]
    pub trace: Option<PathBuf>,

    /// Stock boot check to run
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Leading records to discard
    #[arg(long, value_name = "N")]
    pub skip: Option<usize>,

    /// Stop after this many compared records
    #[arg(long, value_name = "N")]
    pub max_records: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    /// golden_regs.csv, first 501 records
    BootRegs,
    /// tests/golden_files/boot_states.txt, records 2..=51
    BootStates,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::BootRegs => Self::BootRegs,
            PresetArg::BootStates => Self::BootStates,
        }
    }
}
