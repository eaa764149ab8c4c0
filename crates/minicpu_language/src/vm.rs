//! Fetch-execute virtual machine for MiniCPU programs.
//!
//! The VM owns one [`MachineState`] and a program counter, and drives them
//! through a borrowed [`Program`] one instruction at a time. Each step
//! applies exactly one instruction's transition via [`execute`].
//!
//! # Halting
//!
//! The machine halts when `stop` runs, when the program counter leaves the
//! program (a clean end), or when an instruction faults. Faults are returned
//! as errors carrying the program counter; a faulting instruction leaves the
//! machine state untouched.
//!
//! # Observation
//!
//! Execution events can be reported to a [`StepObserver`]. The plain
//! [`Vm::step`] and [`Vm::run`] entry points use [`NoObserver`].

mod observer;
mod output;
mod state;

pub use observer::{NoObserver, StepObserver};
pub use output::{NullSink, OutputSink, WriterSink};
pub use state::{DEFAULT_STACK_CAPACITY, Flags, MachineState, Snapshot};

use std::fmt;

use minicpu_foundation::{Address, Error, ErrorKind, Result, Word};

use crate::instruction::{Instruction, Operand, PrintArg};
use crate::program::{LabelMap, Program};

/// VM configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of words on the stack.
    pub stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
        }
    }
}

impl VmConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the stack capacity.
    #[must_use]
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }
}

/// Why the machine halted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Halt {
    /// `stop` ran.
    Stopped,
    /// The program counter left the program.
    EndOfProgram,
    /// An instruction faulted.
    Faulted,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::EndOfProgram => write!(f, "end of program"),
            Self::Faulted => write!(f, "faulted"),
        }
    }
}

/// Executor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// More instructions may run.
    Running,
    /// No further instructions will run.
    Halted(Halt),
}

/// What an instruction asks the executor to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Continue at this address.
    Next(Address),
    /// Halt.
    Stop,
}

/// Applies one instruction to the machine state.
///
/// `pc` is the instruction's own address. Fall-through instructions return
/// `Next(pc + 1)`.
///
/// # Errors
///
/// Returns a fault (`StackUnderflow`, `StackOverflow`, `UnresolvedLabel`,
/// `InvalidReturnAddress`, `ArithmeticOverflow`) or an `Io` error from the
/// output sink. On error the state is unchanged.
pub fn execute(
    instruction: &Instruction,
    pc: Address,
    state: &mut MachineState,
    labels: &LabelMap,
    out: &mut dyn OutputSink,
) -> Result<Transition> {
    let next = Transition::Next(pc + 1);
    match instruction {
        Instruction::Start | Instruction::Func(_) => Ok(next),
        Instruction::Stop => Ok(Transition::Stop),

        Instruction::Mov(dst, src) => {
            let value = operand_value(state, *src);
            state.write_register(*dst, value);
            Ok(next)
        }
        Instruction::Add(dst, src) => {
            let lhs = state.read_register(*dst);
            let rhs = operand_value(state, *src);
            let sum = lhs
                .checked_add(rhs)
                .ok_or_else(|| Error::overflow("+", lhs, rhs))?;
            state.write_register(*dst, sum);
            Ok(next)
        }
        Instruction::Sub(dst, src) => {
            let lhs = state.read_register(*dst);
            let rhs = operand_value(state, *src);
            let diff = lhs
                .checked_sub(rhs)
                .ok_or_else(|| Error::overflow("-", lhs, rhs))?;
            state.write_register(*dst, diff);
            Ok(next)
        }
        Instruction::Cmp(lhs, rhs) => {
            let a = state.read_register(*lhs);
            let b = operand_value(state, *rhs);
            state.set_flags(a, b);
            Ok(next)
        }

        Instruction::Jmp(target) => Ok(Transition::Next(*target)),
        Instruction::Branch(condition, target) => {
            if condition.holds(state.flags()) {
                Ok(Transition::Next(*target))
            } else {
                Ok(next)
            }
        }

        Instruction::Prn(PrintArg::Text(text)) => {
            out.emit(text)?;
            Ok(next)
        }
        Instruction::Prn(PrintArg::Register(reg)) => {
            out.emit(&state.read_register(*reg).to_string())?;
            Ok(next)
        }

        Instruction::Push(reg) => {
            state.push_stack(state.read_register(*reg))?;
            Ok(next)
        }
        Instruction::Pop(reg) => {
            let value = state.pop_stack()?;
            state.write_register(*reg, value);
            Ok(next)
        }

        Instruction::Call(name) => {
            let entry = labels
                .resolve(name)
                .ok_or_else(|| Error::unresolved_label(name.as_str()))?;
            let return_address = Word::try_from(pc + 1).map_err(|_| {
                Error::new(ErrorKind::Internal(format!(
                    "return address {} does not fit in a word",
                    pc + 1
                )))
            })?;
            state.push_stack(return_address)?;
            Ok(Transition::Next(entry))
        }
        Instruction::Ret => {
            let word = state.peek_stack()?;
            let target = Address::try_from(word)
                .map_err(|_| Error::new(ErrorKind::InvalidReturnAddress(word)))?;
            state.pop_stack()?;
            Ok(Transition::Next(target))
        }
    }
}

fn operand_value(state: &MachineState, operand: Operand) -> Word {
    match operand {
        Operand::Register(reg) => state.read_register(reg),
        Operand::Literal(value) => value,
    }
}

/// Forwards output to the sink and then to the observer.
struct Tee<'a, O: StepObserver> {
    out: &'a mut dyn OutputSink,
    observer: &'a mut O,
    pc: Address,
}

impl<O: StepObserver> OutputSink for Tee<'_, O> {
    fn emit(&mut self, line: &str) -> Result<()> {
        self.out.emit(line)?;
        self.observer.on_output(self.pc, line);
        Ok(())
    }
}

/// The fetch-execute loop over one program.
pub struct Vm<'p> {
    program: &'p Program,
    state: MachineState,
    pc: Address,
    status: Status,
    steps: u64,
}

impl<'p> Vm<'p> {
    /// Creates a VM positioned at the program's entry point.
    #[must_use]
    pub fn new(program: &'p Program) -> Self {
        Self::with_config(program, VmConfig::default())
    }

    /// Creates a VM with the given configuration.
    #[must_use]
    pub fn with_config(program: &'p Program, config: VmConfig) -> Self {
        Self {
            program,
            state: MachineState::with_stack_capacity(config.stack_capacity),
            pc: program.entry_point(),
            status: Status::Running,
            steps: 0,
        }
    }

    /// Returns the program being executed.
    #[must_use]
    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Returns the machine state.
    #[must_use]
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Returns the program counter.
    #[must_use]
    pub fn pc(&self) -> Address {
        self.pc
    }

    /// Returns the executor state.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns true once the machine has halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted(_))
    }

    /// Returns the number of instructions executed successfully.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Captures the machine state and program counter.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(self.pc)
    }

    /// Resumes from a snapshot: state and program counter are replaced and
    /// the machine is running again.
    ///
    /// # Errors
    ///
    /// Returns `StackOverflow` if the snapshot's stack exceeds capacity.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.state.restore(snapshot)?;
        self.pc = snapshot.pc;
        self.status = Status::Running;
        Ok(())
    }

    /// Returns to the initial state at the entry point.
    pub fn reset(&mut self) {
        self.state.reset();
        self.pc = self.program.entry_point();
        self.status = Status::Running;
        self.steps = 0;
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the instruction; the machine is halted.
    pub fn step(&mut self, out: &mut dyn OutputSink) -> Result<Status> {
        self.step_observed(out, &mut NoObserver)
    }

    /// Executes one instruction, reporting events to an observer.
    ///
    /// Stepping a halted machine does nothing and returns its status.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the instruction; the machine is halted.
    pub fn step_observed<O: StepObserver>(
        &mut self,
        out: &mut dyn OutputSink,
        observer: &mut O,
    ) -> Result<Status> {
        if self.is_halted() {
            return Ok(self.status);
        }

        let pc = self.pc;
        let program = self.program;
        let Some(instruction) = program.get(pc) else {
            self.halt(Halt::EndOfProgram, observer);
            return Ok(self.status);
        };

        let result = {
            let mut sink = Tee {
                out,
                observer: &mut *observer,
                pc,
            };
            execute(instruction, pc, &mut self.state, program.labels(), &mut sink)
        };

        match result {
            Ok(Transition::Next(next)) => {
                self.steps += 1;
                self.pc = next;
                observer.on_step(pc, instruction, Some(next), &self.state);
                Ok(self.status)
            }
            Ok(Transition::Stop) => {
                self.steps += 1;
                observer.on_step(pc, instruction, None, &self.state);
                self.halt(Halt::Stopped, observer);
                Ok(self.status)
            }
            Err(err) => {
                let err = self.annotate(err, pc, instruction);
                observer.on_fault(pc, &err);
                self.halt(Halt::Faulted, observer);
                Err(err)
            }
        }
    }

    /// Runs until the machine halts.
    ///
    /// A program that never halts never returns; use [`Vm::run_for`] to
    /// bound execution.
    ///
    /// # Errors
    ///
    /// Returns the first fault.
    pub fn run(&mut self, out: &mut dyn OutputSink) -> Result<Halt> {
        self.run_observed(out, &mut NoObserver)
    }

    /// Runs until the machine halts, reporting events to an observer.
    ///
    /// # Errors
    ///
    /// Returns the first fault.
    pub fn run_observed<O: StepObserver>(
        &mut self,
        out: &mut dyn OutputSink,
        observer: &mut O,
    ) -> Result<Halt> {
        loop {
            if let Status::Halted(halt) = self.step_observed(out, observer)? {
                return Ok(halt);
            }
        }
    }

    /// Runs at most `max_steps` steps, then hands control back.
    ///
    /// Returns `Running` if the budget ran out first; the machine can be
    /// resumed with another call.
    ///
    /// # Errors
    ///
    /// Returns the first fault.
    pub fn run_for<O: StepObserver>(
        &mut self,
        out: &mut dyn OutputSink,
        observer: &mut O,
        max_steps: u64,
    ) -> Result<Status> {
        for _ in 0..max_steps {
            if self.step_observed(out, observer)? != Status::Running {
                break;
            }
        }
        Ok(self.status)
    }

    fn halt<O: StepObserver>(&mut self, halt: Halt, observer: &mut O) {
        self.status = Status::Halted(halt);
        observer.on_halt(self.pc, halt);
    }

    fn annotate(&self, err: Error, pc: Address, instruction: &Instruction) -> Error {
        let Error { kind, context } = err;
        let mut context = context
            .unwrap_or_default()
            .with_pc(pc)
            .with_instruction(instruction.to_string());
        if let Some(line) = self.program.source_line(pc).and_then(|l| usize::try_from(l).ok()) {
            context = context.with_line(line);
        }
        Error::new(kind).with_context(context)
    }
}

/// Runs a program to completion, collecting its output.
///
/// # Errors
///
/// Returns the first fault.
pub fn run_program(program: &Program) -> Result<(Halt, Vec<String>)> {
    let mut out: Vec<String> = Vec::new();
    let halt = Vm::new(program).run(&mut out)?;
    Ok((halt, out))
}
