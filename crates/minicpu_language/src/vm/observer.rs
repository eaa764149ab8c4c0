//! Execution observer hooks.
//!
//! The VM reports every executed instruction, output line, halt, and fault
//! to a [`StepObserver`]. The default [`NoObserver`] compiles to nothing;
//! the debug layer implements the trait to build execution traces.

use minicpu_foundation::{Address, Error};

use super::{Halt, MachineState};
use crate::instruction::Instruction;

/// Receives execution events from the VM.
///
/// All methods default to doing nothing.
pub trait StepObserver {
    /// Called after an instruction completes.
    ///
    /// `next` is the program counter the VM moves to, or `None` when the
    /// instruction halted the machine.
    fn on_step(
        &mut self,
        pc: Address,
        instruction: &Instruction,
        next: Option<Address>,
        state: &MachineState,
    ) {
        let _ = (pc, instruction, next, state);
    }

    /// Called when `prn` emits a line.
    fn on_output(&mut self, pc: Address, line: &str) {
        let _ = (pc, line);
    }

    /// Called once when the machine halts, including after a fault.
    fn on_halt(&mut self, pc: Address, halt: Halt) {
        let _ = (pc, halt);
    }

    /// Called when an instruction faults, before `on_halt`.
    fn on_fault(&mut self, pc: Address, error: &Error) {
        let _ = (pc, error);
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObserver;

impl StepObserver for NoObserver {}

impl<O: StepObserver + ?Sized> StepObserver for &mut O {
    fn on_step(
        &mut self,
        pc: Address,
        instruction: &Instruction,
        next: Option<Address>,
        state: &MachineState,
    ) {
        (**self).on_step(pc, instruction, next, state);
    }

    fn on_output(&mut self, pc: Address, line: &str) {
        (**self).on_output(pc, line);
    }

    fn on_halt(&mut self, pc: Address, halt: Halt) {
        (**self).on_halt(pc, halt);
    }

    fn on_fault(&mut self, pc: Address, error: &Error) {
        (**self).on_fault(pc, error);
    }
}
