//! Decoded programs and the function label map.

use std::collections::HashMap;

use minicpu_foundation::{Address, Error, ErrorContext, ErrorKind, Result};

use crate::instruction::Instruction;

/// Maps function names to the address just after their `func` marker.
///
/// Names are case-insensitive; they are stored upper-cased.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, Address>,
}

impl LabelMap {
    /// Creates an empty label map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function entry point.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLabel` if the name is already registered.
    pub fn insert(&mut self, name: &str, entry: Address) -> Result<()> {
        let key = name.to_ascii_uppercase();
        if self.entries.contains_key(&key) {
            return Err(Error::new(ErrorKind::DuplicateLabel(key)));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Looks up a function entry point.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Address> {
        self.entries.get(&name.to_ascii_uppercase()).copied()
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no labels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the labels sorted by entry address.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, Address)> {
        let mut labels: Vec<_> = self
            .entries
            .iter()
            .map(|(name, addr)| (name.as_str(), *addr))
            .collect();
        labels.sort_by_key(|(name, addr)| (*addr, *name));
        labels
    }
}

/// An immutable sequence of instructions plus its label map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: LabelMap,
    /// Source line of each instruction, when decoded from text.
    lines: Vec<u32>,
}

impl Program {
    /// Builds a program, deriving the label map from its `func` markers.
    ///
    /// Function names are upper-cased and jump targets past the end are
    /// pulled back to the end of the program, the same forms the decoder
    /// produces.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLabel` if two `func` markers share a name.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        let instructions = normalize(instructions);
        let mut labels = LabelMap::new();
        for (addr, instruction) in instructions.iter().enumerate() {
            if let Instruction::Func(name) = instruction {
                labels
                    .insert(name, addr + 1)
                    .map_err(|e| e.with_context(ErrorContext::new().with_pc(addr)))?;
            }
        }
        Ok(Self {
            instructions,
            labels,
            lines: Vec::new(),
        })
    }

    /// Builds a program from instructions and an externally built label map.
    ///
    /// Instructions are normalized as in [`Program::new`].
    #[must_use]
    pub fn with_labels(instructions: Vec<Instruction>, labels: LabelMap) -> Self {
        Self {
            instructions: normalize(instructions),
            labels,
            lines: Vec::new(),
        }
    }

    /// Attaches the source line of every instruction.
    #[must_use]
    pub(crate) fn with_source_lines(mut self, lines: Vec<u32>) -> Self {
        debug_assert_eq!(lines.len(), self.instructions.len());
        self.lines = lines;
        self
    }

    /// Returns the instruction at an address.
    #[must_use]
    pub fn get(&self, pc: Address) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Returns all instructions.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the label map.
    #[must_use]
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Address execution starts from: the first `start`, or 0.
    #[must_use]
    pub fn entry_point(&self) -> Address {
        self.instructions
            .iter()
            .position(|i| *i == Instruction::Start)
            .unwrap_or(0)
    }

    /// Source line an instruction was decoded from.
    #[must_use]
    pub fn source_line(&self, pc: Address) -> Option<u32> {
        self.lines.get(pc).copied()
    }

    /// Renders the program as assembly text, one instruction per line.
    ///
    /// Jump targets become line numbers, so decoding the result yields an
    /// identical instruction sequence.
    #[must_use]
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_source(|addr| addr + 1));
            out.push('\n');
        }
        out
    }

    /// Renders an addressed listing for display.
    #[must_use]
    pub fn listing(&self) -> String {
        let width = self.len().max(1).to_string().len();
        self.instructions
            .iter()
            .enumerate()
            .map(|(addr, instruction)| format!("{addr:>width$}  {instruction}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Upper-cases function names and clamps jump targets to `len`.
fn normalize(mut instructions: Vec<Instruction>) -> Vec<Instruction> {
    let end = instructions.len();
    for instruction in &mut instructions {
        match instruction {
            Instruction::Func(name) | Instruction::Call(name) => name.make_ascii_uppercase(),
            Instruction::Jmp(target) | Instruction::Branch(_, target) => {
                *target = (*target).min(end);
            }
            _ => {}
        }
    }
    instructions
}
