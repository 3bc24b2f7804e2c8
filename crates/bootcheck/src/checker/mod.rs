//! Differential check of live CPU registers against a golden trace.
//!
//! For every golden record the checker runs the target to the record's pc,
//! dumps the live registers and compares all six pairs. The first
//! divergence ends the run: once the emulator has left the golden path every
//! later comparison is meaningless.
//!
//! ```text
//! Init ──> Running ──> Passed
//!             │
//!             └──────> Failed   (mismatch or any error)
//! ```

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use bootcheck_regs::{Register, RegisterFile};
use bootcheck_trace::{GoldenRecord, GoldenTraceReader, TraceConfig};
use tracing::{debug, error, info, info_span};

use crate::metrics;
use crate::session::{DEFAULT_ENDPOINT, DebugSession, SessionConfig};
use crate::Result;


/// Everything a check run needs, fixed before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Golden trace location.
    pub trace_path: PathBuf,
    /// Which records of the trace are checked.
    pub trace: TraceConfig,
    /// Remote stub address (`host:port`).
    pub endpoint: String,
    /// Debug session settings.
    pub session: SessionConfig,
}

impl CheckConfig {
    pub fn new(trace_path: impl Into<PathBuf>) -> Self {
        Self {
            trace_path: trace_path.into(),
            trace: TraceConfig::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session: SessionConfig::default(),
        }
    }
}

/// Checker state machine phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Init,
    Running,
    Passed,
    Failed,
}

/// First divergence between live and golden registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 1-based comparison number.
    pub step: usize,
    /// Trace line of the golden record.
    pub line: usize,
    pub live: RegisterFile,
    pub golden: RegisterFile,
}

impl Mismatch {
    /// Registers that differ.
    pub fn registers(&self) -> Vec<Register> {
        self.live.diff(&self.golden)
    }
}

/// Two-line `live:` / `golden:` diagnostic.
impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "live:   {}", self.live)?;
        write!(f, "golden: {}", self.golden)
    }
}

/// Result of a completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed { compared: usize },
    Failed(Mismatch),
}

impl CheckOutcome {
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Process exit status for this outcome.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Passed { .. } => 0,
            Self::Failed(_) => 1,
        }
    }
}

/// State carried across loop iterations.
///
/// `golden` accumulates trace records; `live` is refreshed from every
/// register dump but never reset, so registers missing from a dump keep
/// their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    pub golden: RegisterFile,
    pub live: RegisterFile,
    pub compared: usize,
    pub phase: Phase,
}

type StepHook = Box<dyn FnMut(usize, u16)>;

/// Drives a [`DebugSession`] through a golden trace.
pub struct TraceChecker<S> {
    session: S,
    state: LoopState,
    on_step: Option<StepHook>,
}

impl<S: DebugSession> TraceChecker<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            state: LoopState::default(),
            on_step: None,
        }
    }

    /// Call `hook(step, pc)` after every comparison.
    #[must_use]
    pub fn on_step(mut self, hook: impl FnMut(usize, u16) + 'static) -> Self {
        self.on_step = Some(Box::new(hook));
        self
    }

    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Open the configured trace and run the whole check.
    pub fn check(&mut self, config: &CheckConfig) -> Result<CheckOutcome> {
        let records = match GoldenTraceReader::open(&config.trace_path, config.trace) {
            Ok(records) => records,
            Err(err) => {
                self.state.phase = Phase::Failed;
                return Err(err.into());
            }
        };
        self.run(records, &config.endpoint, &config.session)
    }

    /// Run the check over already opened records.
    pub fn run<R: BufRead>(
        &mut self,
        records: GoldenTraceReader<R>,
        endpoint: &str,
        config: &SessionConfig,
    ) -> Result<CheckOutcome> {
        let span = info_span!("check", endpoint);
        let _enter = span.enter();
        let start = Instant::now();

        self.state = LoopState::default();
        let result = self.run_records(records, endpoint, config);
        if result.is_err() {
            self.state.phase = Phase::Failed;
        }
        if let Ok(outcome) = &result {
            metrics::record_outcome(outcome, start.elapsed());
        }
        result
    }

    fn run_records<R: BufRead>(
        &mut self,
        mut records: GoldenTraceReader<R>,
        endpoint: &str,
        config: &SessionConfig,
    ) -> Result<CheckOutcome> {
        // Reading ahead makes a corrupt trace head fail before the target is touched.
        let first = records.next_record().transpose()?;

        self.session.configure(config)?;
        self.session.attach(endpoint)?;
        info!(endpoint, arch = %config.architecture, "attached");
        self.state.phase = Phase::Running;

        for record in first.into_iter().map(Ok).chain(records) {
            if let Some(mismatch) = self.step(&record?)? {
                return Ok(CheckOutcome::Failed(mismatch));
            }
        }

        self.session.disconnect()?;
        self.state.phase = Phase::Passed;
        info!(compared = self.state.compared, "golden trace matched");
        Ok(CheckOutcome::Passed {
            compared: self.state.compared,
        })
    }

    /// Check a single record: merge, run to its pc, sample, compare.
    pub fn step(&mut self, record: &GoldenRecord) -> Result<Option<Mismatch>> {
        let step = self.state.compared + 1;
        self.state.golden.apply(&record.update);
        let pc = self.state.golden.pc;
        debug!(step, line = record.line, pc = %format_args!("{pc:#06x}"), "running to breakpoint");

        self.session.set_temporary_breakpoint(pc)?;
        let resumed = Instant::now();
        self.session.resume()?;
        metrics::record_resume(resumed.elapsed());

        let dump = self.session.dump_registers()?;
        self.state.live.update_from_freeform_dump(&dump)?;
        self.state.compared = step;
        metrics::record_step();
        if let Some(hook) = self.on_step.as_mut() {
            hook(step, pc);
        }

        if self.state.live == self.state.golden {
            return Ok(None);
        }

        let mismatch = Mismatch {
            step,
            line: record.line,
            live: self.state.live,
            golden: self.state.golden,
        };
        error!(
            step,
            line = record.line,
            pc = %format_args!("{pc:#06x}"),
            registers = ?mismatch.registers(),
            "register mismatch"
        );
        self.state.phase = Phase::Failed;
        Ok(Some(mismatch))
    }
}

/// Run a full check with `session`.
pub fn check<S: DebugSession>(session: S, config: &CheckConfig) -> Result<CheckOutcome> {
    TraceChecker::new(session).check(config)
}
