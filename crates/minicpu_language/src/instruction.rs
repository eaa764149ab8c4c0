//! The MiniCPU instruction set.
//!
//! Instructions are immutable values produced once by the decoder. The VM
//! reads their operands and applies the matching state transition; nothing
//! ever mutates an instruction after it is built.

use std::fmt;

use minicpu_foundation::{Address, Register, Word};

use crate::vm::Flags;

/// Source operand of `mov`, `add`, `sub`, and `cmp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Read the value of a register.
    Register(Register),
    /// Use a literal word.
    Literal(Word),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{reg}"),
            Self::Literal(value) => write!(f, "{value}"),
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Self::Register(reg)
    }
}

impl From<Word> for Operand {
    fn from(value: Word) -> Self {
        Self::Literal(value)
    }
}

/// Argument of `prn`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrintArg {
    /// Emit text verbatim.
    Text(String),
    /// Emit a register's value in decimal.
    Register(Register),
}

impl fmt::Display for PrintArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::Register(reg) => write!(f, "{reg}"),
        }
    }
}

/// Flag predicate tested by a conditional jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `je`
    Equal,
    /// `jne`
    NotEqual,
    /// `jlt`
    Less,
    /// `jle`
    LessOrEqual,
    /// `jgt`
    Greater,
    /// `jge`
    GreaterOrEqual,
}

impl Condition {
    /// All conditions, in mnemonic order.
    pub const ALL: [Condition; 6] = [
        Condition::Equal,
        Condition::NotEqual,
        Condition::Less,
        Condition::LessOrEqual,
        Condition::Greater,
        Condition::GreaterOrEqual,
    ];

    /// Returns true if the jump should be taken for these flags.
    #[must_use]
    pub const fn holds(self, flags: Flags) -> bool {
        match self {
            Self::Equal => flags.equal,
            Self::NotEqual => !flags.equal,
            Self::Less => flags.less,
            Self::LessOrEqual => flags.less || flags.equal,
            Self::Greater => flags.greater,
            Self::GreaterOrEqual => flags.greater || flags.equal,
        }
    }

    /// Returns the jump mnemonic for this condition.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Equal => "je",
            Self::NotEqual => "jne",
            Self::Less => "jlt",
            Self::LessOrEqual => "jle",
            Self::Greater => "jgt",
            Self::GreaterOrEqual => "jge",
        }
    }

    /// Looks up a condition by jump mnemonic (lower case).
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.mnemonic() == mnemonic)
    }
}

/// A single decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Entry-point marker; a no-op when executed.
    Start,
    /// Halt the machine.
    Stop,
    /// `dst = src`
    Mov(Register, Operand),
    /// `dst += src`
    Add(Register, Operand),
    /// `dst -= src`
    Sub(Register, Operand),
    /// Set flags from comparing a register with an operand.
    Cmp(Register, Operand),
    /// Unconditional jump to an absolute address.
    Jmp(Address),
    /// Jump to an absolute address if the condition holds.
    Branch(Condition, Address),
    /// Emit a line to the output sink.
    Prn(PrintArg),
    /// Push a register onto the stack.
    Push(Register),
    /// Pop the stack into a register.
    Pop(Register),
    /// Function entry marker; a no-op when executed.
    Func(String),
    /// Push the return address and jump to a function.
    Call(String),
    /// Pop a return address and jump to it.
    Ret,
}

impl Instruction {
    /// Every opcode mnemonic, in canonical lowercase.
    pub const MNEMONICS: [&'static str; 19] = [
        "start", "stop", "mov", "add", "sub", "cmp", "jmp", "je", "jne", "jlt", "jle", "jgt",
        "jge", "prn", "push", "pop", "func", "call", "ret",
    ];

    /// Returns the opcode mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Mov(..) => "mov",
            Self::Add(..) => "add",
            Self::Sub(..) => "sub",
            Self::Cmp(..) => "cmp",
            Self::Jmp(_) => "jmp",
            Self::Branch(cond, _) => cond.mnemonic(),
            Self::Prn(_) => "prn",
            Self::Push(_) => "push",
            Self::Pop(_) => "pop",
            Self::Func(_) => "func",
            Self::Call(_) => "call",
            Self::Ret => "ret",
        }
    }

    /// Returns the jump target for `jmp` and conditional jumps.
    #[must_use]
    pub const fn jump_target(&self) -> Option<Address> {
        match self {
            Self::Jmp(target) | Self::Branch(_, target) => Some(*target),
            _ => None,
        }
    }

    /// Renders the instruction as assembly source.
    ///
    /// Jump targets are rendered through `line_of`, which maps an address to
    /// the source line the decoder should resolve back to that address.
    pub fn to_source(&self, line_of: impl Fn(Address) -> usize) -> String {
        match self {
            Self::Jmp(target) | Self::Branch(_, target) => {
                format!("{} {}", self.mnemonic(), line_of(*target))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Instruction {
    /// Jump targets are shown as `@address`, which is a listing form, not
    /// source; use [`Instruction::to_source`] for text the decoder accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start | Self::Stop | Self::Ret => write!(f, "{}", self.mnemonic()),
            Self::Mov(dst, src) | Self::Add(dst, src) | Self::Sub(dst, src) | Self::Cmp(dst, src) => {
                write!(f, "{} {dst}, {src}", self.mnemonic())
            }
            Self::Jmp(target) | Self::Branch(_, target) => {
                write!(f, "{} @{target}", self.mnemonic())
            }
            Self::Prn(arg) => write!(f, "prn {arg}"),
            Self::Push(reg) => write!(f, "push {reg}"),
            Self::Pop(reg) => write!(f, "pop {reg}"),
            Self::Func(name) => write!(f, "func {name}"),
            Self::Call(name) => write!(f, "call {name}"),
        }
    }
}
