//! Session state for the REPL.
//!
//! A session owns the program buffer typed so far, the VM configuration,
//! the tracer, and the machine state left behind by the last `:run` or
//! `:step`.

use std::fs;
use std::path::Path;

use minicpu_debug::Tracer;
use minicpu_foundation::{Address, Error, Result};
use minicpu_language::{OutputSink, Program, Snapshot, Status, Vm, VmConfig, decode};

use crate::runner::{self, RunOptions, RunReport};
use crate::serialize::{self, StateDump};

/// Step budget for `:run` when none is configured.
pub const DEFAULT_REPL_STEP_LIMIT: u64 = 1_000_000;

/// Machine state carried between REPL commands.
#[derive(Clone, Debug)]
struct Cursor {
    snapshot: Snapshot,
    status: Status,
    steps: u64,
}

/// What a single `:step` did.
#[derive(Debug)]
pub struct StepReport {
    /// Address of the instruction that ran, or where the machine halted.
    pub pc: Address,
    /// The instruction, rendered, if one ran.
    pub instruction: Option<String>,
    /// Executor state afterwards.
    pub status: Status,
    /// The fault raised, if any.
    pub fault: Option<Error>,
}

/// Session state for an interactive REPL session.
pub struct Session {
    /// Source lines entered so far.
    lines: Vec<String>,

    /// Run options for `:run` and `:step`.
    options: RunOptions,

    /// Tracer for observability.
    tracer: Tracer,

    /// Where the last `:run` or `:step` left the machine.
    cursor: Option<Cursor>,
}

impl Session {
    /// Creates a new session with an empty program buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RunOptions::new().with_max_steps(DEFAULT_REPL_STEP_LIMIT))
    }

    /// Creates a new session with the given run options.
    #[must_use]
    pub fn with_options(options: RunOptions) -> Self {
        Self {
            lines: Vec::new(),
            options,
            tracer: Tracer::disabled(),
            cursor: None,
        }
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Returns the VM configuration.
    #[must_use]
    pub const fn config(&self) -> VmConfig {
        self.options.config
    }

    /// Returns the source lines entered so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the program buffer as source text.
    #[must_use]
    pub fn source(&self) -> String {
        let mut source = self.lines.join("\n");
        if !source.is_empty() {
            source.push('\n');
        }
        source
    }

    /// Decodes the program buffer.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the buffer is malformed.
    pub fn program(&self) -> Result<Program> {
        decode(&self.source())
    }

    /// Appends a source line, keeping the buffer decodable.
    ///
    /// # Errors
    ///
    /// Returns the decode error and leaves the buffer unchanged if the line
    /// would make the program malformed.
    pub fn append_line(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        if let Err(err) = self.program() {
            self.lines.pop();
            return Err(err);
        }
        self.cursor = None;
        Ok(())
    }

    /// Empties the program buffer and forgets the machine state.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.cursor = None;
    }

    /// Replaces the program buffer with a file's contents.
    ///
    /// Returns the number of lines loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not decode; the
    /// buffer is unchanged in that case.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}: {e}", path.display())))?;
        decode(&source).map_err(|e| e.in_source(path.display().to_string()))?;

        self.lines = source.lines().map(String::from).collect();
        self.cursor = None;
        Ok(self.lines.len())
    }

    /// Writes the program buffer to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.source())
            .map_err(|e| Error::io(format!("failed to write {}: {e}", path.display())))
    }

    /// Writes the current machine state to a `MessagePack` file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn dump_state(&self, path: &Path) -> Result<()> {
        serialize::save_to_file(&StateDump::new(self.snapshot(), self.steps()), path)
    }

    /// Returns the tracer.
    #[must_use]
    pub const fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Returns a mutable reference to the tracer.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Replaces the tracer.
    pub fn set_tracer(&mut self, tracer: Tracer) {
        self.tracer = tracer;
    }

    /// Returns the machine state after the last `:run` or `:step`, or the
    /// initial state at the entry point if nothing has run yet.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        match &self.cursor {
            Some(cursor) => cursor.snapshot.clone(),
            None => Snapshot {
                pc: self.program().map_or(0, |p| p.entry_point()),
                ..Snapshot::default()
            },
        }
    }

    /// Returns the executor state, or `Running` if nothing has run yet.
    #[must_use]
    pub fn status(&self) -> Status {
        self.cursor.as_ref().map_or(Status::Running, |c| c.status)
    }

    /// Returns the number of instructions executed so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.cursor.as_ref().map_or(0, |c| c.steps)
    }

    /// Runs the program buffer from the start.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the buffer is malformed. Faults are
    /// reported in the [`RunReport`].
    pub fn run(&mut self, out: &mut dyn OutputSink) -> Result<RunReport> {
        let program = self.program()?;
        self.tracer.reset_steps();
        self.tracer.clear();
        let report = runner::run(&program, &self.options, out, &mut self.tracer);
        self.cursor = Some(Cursor {
            snapshot: report.snapshot.clone(),
            status: report.status,
            steps: report.steps,
        });
        Ok(report)
    }

    /// Executes one instruction, continuing from the last `:run` or `:step`.
    ///
    /// Stepping a halted machine does nothing.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the buffer is malformed. Faults are
    /// reported in the [`StepReport`].
    pub fn step(&mut self, out: &mut dyn OutputSink) -> Result<StepReport> {
        let program = self.program()?;
        let mut vm = Vm::with_config(&program, self.options.config);
        let mut steps = 0;

        match &self.cursor {
            Some(cursor) if cursor.status != Status::Running => {
                return Ok(StepReport {
                    pc: cursor.snapshot.pc,
                    instruction: None,
                    status: cursor.status,
                    fault: None,
                });
            }
            Some(cursor) => {
                vm.restore(&cursor.snapshot)?;
                steps = cursor.steps;
            }
            None => {
                self.tracer.reset_steps();
                self.tracer.clear();
            }
        }

        let pc = vm.pc();
        let instruction = program.get(pc).map(ToString::to_string);
        let fault = vm.step_observed(out, &mut self.tracer).err();
        let steps = steps + vm.steps();

        self.cursor = Some(Cursor {
            snapshot: vm.snapshot(),
            status: vm.status(),
            steps,
        });

        Ok(StepReport {
            pc,
            instruction,
            status: vm.status(),
            fault,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
