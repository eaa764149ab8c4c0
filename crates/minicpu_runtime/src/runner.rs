//! Batch execution of assembly sources.
//!
//! The runner decodes a source, drives a [`Vm`] under a step budget, and
//! reports where the machine ended up. Faults are part of the report rather
//! than an early return so callers can still inspect or dump the final state.

use std::fs;
use std::path::Path;

use minicpu_foundation::{Error, Result};
use minicpu_language::{
    Halt, OutputSink, Program, Snapshot, Status, StepObserver, Vm, VmConfig, decode,
};

/// Options for a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// VM configuration.
    pub config: VmConfig,
    /// Maximum number of steps before the runner gives up, if any.
    pub max_steps: Option<u64>,
}

impl RunOptions {
    /// Creates default options: default VM configuration, no step limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the stack capacity.
    #[must_use]
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_stack_capacity(capacity);
        self
    }

    /// Builder method to limit the number of steps.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// The outcome of a batch run.
#[derive(Debug)]
pub struct RunReport {
    /// Executor state at the end of the run. `Running` means the step budget
    /// ran out.
    pub status: Status,
    /// Instructions executed successfully.
    pub steps: u64,
    /// Final registers, flags, stack, and program counter.
    pub snapshot: Snapshot,
    /// The fault that halted the machine, if any.
    pub fault: Option<Error>,
}

impl RunReport {
    /// Returns true if the program halted without a fault.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(
            self.status,
            Status::Halted(Halt::Stopped | Halt::EndOfProgram)
        )
    }

    /// Returns true if the step budget ran out before the program halted.
    #[must_use]
    pub fn hit_step_limit(&self) -> bool {
        self.status == Status::Running
    }

    /// Converts a faulted report into its fault.
    ///
    /// # Errors
    ///
    /// Returns the fault, if there was one.
    pub fn into_result(self) -> Result<Self> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self),
        }
    }

    /// One-line summary of how the run ended.
    #[must_use]
    pub fn summary(&self) -> String {
        match (&self.fault, self.status) {
            (Some(fault), _) => format!("fault: {}", fault.describe()),
            (None, Status::Running) => {
                format!("step limit reached after {} steps", self.steps)
            }
            (None, Status::Halted(halt)) => format!("{halt} after {} steps", self.steps),
        }
    }
}

/// Runs a decoded program.
pub fn run<O: StepObserver>(
    program: &Program,
    options: &RunOptions,
    out: &mut dyn OutputSink,
    observer: &mut O,
) -> RunReport {
    let mut vm = Vm::with_config(program, options.config);
    let result = match options.max_steps {
        Some(limit) => vm.run_for(out, observer, limit),
        None => vm.run_observed(out, observer).map(Status::Halted),
    };

    RunReport {
        status: vm.status(),
        steps: vm.steps(),
        snapshot: vm.snapshot(),
        fault: result.err(),
    }
}

/// Decodes and runs source text.
///
/// `name` labels decode errors and faults.
///
/// # Errors
///
/// Returns the decode error if the source is malformed. Faults are reported
/// in the [`RunReport`].
pub fn run_source<O: StepObserver>(
    name: &str,
    source: &str,
    options: &RunOptions,
    out: &mut dyn OutputSink,
    observer: &mut O,
) -> Result<RunReport> {
    let program = decode(source).map_err(|e| e.in_source(name))?;
    let mut report = run(&program, options, out, observer);
    report.fault = report.fault.map(|e| e.in_source(name));
    Ok(report)
}

/// Reads, decodes, and runs a source file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to decode.
pub fn run_file<O: StepObserver>(
    path: &Path,
    options: &RunOptions,
    out: &mut dyn OutputSink,
    observer: &mut O,
) -> Result<RunReport> {
    let source = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read {}: {e}", path.display())))?;
    run_source(&path.display().to_string(), &source, options, out, observer)
}
