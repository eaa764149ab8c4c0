//! Machine words, addresses, and the register set.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value held by a register or a stack slot.
///
/// Words are 64-bit signed integers. Arithmetic on them is checked; overflow
/// is a machine fault rather than wrapping.
pub type Word = i64;

/// Index of an instruction within a program.
pub type Address = usize;

/// One of the four general-purpose registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Register {
    /// Register `A`.
    A,
    /// Register `B`.
    B,
    /// Register `C`.
    C,
    /// Register `D`.
    D,
}

impl Register {
    /// Number of registers in the register file.
    pub const COUNT: usize = 4;

    /// All registers, in file order.
    pub const ALL: [Register; Register::COUNT] = [Register::A, Register::B, Register::C, Register::D];

    /// Returns the slot of this register in the register file.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Returns the register's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Parses a register name, ignoring case.
    ///
    /// Returns `None` for anything other than a single `A`-`D` letter.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "C" | "c" => Some(Self::C),
            "D" | "d" => Some(Self::D),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            crate::Error::new(crate::ErrorKind::InvalidOperand {
                operand: s.to_string(),
                expected: "register",
            })
        })
    }
}
