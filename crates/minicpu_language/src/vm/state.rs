//! Machine state: registers, flags, and the stack.
//!
//! [`MachineState`] is the only mutation surface instructions have. Every
//! operation either applies fully or fails without touching anything.

use std::fmt;

use minicpu_foundation::{Address, Error, Register, Result, Word};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default stack capacity, in words.
pub const DEFAULT_STACK_CAPACITY: usize = 65_536;

/// Result of the most recent `cmp`.
///
/// Before any comparison runs all three flags are false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Flags {
    /// Operands were equal.
    pub equal: bool,
    /// Left operand was less than the right.
    pub less: bool,
    /// Left operand was greater than the right.
    pub greater: bool,
}

impl Flags {
    /// Computes the flags for comparing `a` with `b`.
    #[must_use]
    pub const fn compare(a: Word, b: Word) -> Self {
        Self {
            equal: a == b,
            less: a < b,
            greater: a > b,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            bit(self.equal, 'E'),
            bit(self.less, 'L'),
            bit(self.greater, 'G')
        )
    }
}

/// Register file, flags, and stack for one program run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineState {
    registers: [Word; Register::COUNT],
    flags: Flags,
    stack: Vec<Word>,
    stack_capacity: usize,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineState {
    /// Creates a zeroed state with the default stack capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stack_capacity(DEFAULT_STACK_CAPACITY)
    }

    /// Creates a zeroed state with the given stack capacity.
    #[must_use]
    pub fn with_stack_capacity(stack_capacity: usize) -> Self {
        Self {
            registers: [0; Register::COUNT],
            flags: Flags::default(),
            stack: Vec::new(),
            stack_capacity,
        }
    }

    /// Zeroes registers, clears flags, and empties the stack.
    pub fn reset(&mut self) {
        self.registers = [0; Register::COUNT];
        self.flags = Flags::default();
        self.stack.clear();
    }

    /// Reads a register.
    #[must_use]
    pub fn read_register(&self, reg: Register) -> Word {
        self.registers[reg.index()]
    }

    /// Writes a register.
    pub fn write_register(&mut self, reg: Register, value: Word) {
        self.registers[reg.index()] = value;
    }

    /// Returns all registers in `A`..`D` order.
    #[must_use]
    pub fn registers(&self) -> [Word; Register::COUNT] {
        self.registers
    }

    /// Returns the flags left by the last comparison.
    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Replaces the flags with the result of comparing `a` with `b`.
    pub fn set_flags(&mut self, a: Word, b: Word) {
        self.flags = Flags::compare(a, b);
    }

    /// Pushes a word.
    ///
    /// # Errors
    ///
    /// Returns `StackOverflow` if the stack is at capacity.
    pub fn push_stack(&mut self, value: Word) -> Result<()> {
        if self.stack.len() >= self.stack_capacity {
            return Err(Error::stack_overflow(self.stack_capacity));
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pops a word.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop_stack(&mut self) -> Result<Word> {
        self.stack.pop().ok_or_else(Error::stack_underflow)
    }

    /// Returns the top of the stack without popping it.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn peek_stack(&self) -> Result<Word> {
        self.stack.last().copied().ok_or_else(Error::stack_underflow)
    }

    /// Returns the stack, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[Word] {
        &self.stack
    }

    /// Returns the number of words on the stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the stack capacity.
    #[must_use]
    pub fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }

    /// Captures the state together with a program counter.
    #[must_use]
    pub fn snapshot(&self, pc: Address) -> Snapshot {
        Snapshot {
            registers: self.registers,
            flags: self.flags,
            stack: self.stack.clone(),
            pc,
        }
    }

    /// Overwrites registers, flags, and stack from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StackOverflow` if the snapshot's stack exceeds this state's
    /// capacity; the state is left unchanged in that case.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.stack.len() > self.stack_capacity {
            return Err(Error::stack_overflow(self.stack_capacity));
        }
        self.registers = snapshot.registers;
        self.flags = snapshot.flags;
        self.stack.clone_from(&snapshot.stack);
        Ok(())
    }
}

/// A copy of the machine state plus program counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// Register values in `A`..`D` order.
    pub registers: [Word; Register::COUNT],
    /// Flags from the last comparison.
    pub flags: Flags,
    /// Stack contents, bottom first.
    pub stack: Vec<Word>,
    /// Program counter.
    pub pc: Address,
}

impl Snapshot {
    /// Returns the value of one register.
    #[must_use]
    pub fn register(&self, reg: Register) -> Word {
        self.registers[reg.index()]
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reg in Register::ALL {
            write!(f, "{reg}={} ", self.register(reg))?;
        }
        write!(f, "flags={} pc={} stack={:?}", self.flags, self.pc, self.stack)
    }
}
