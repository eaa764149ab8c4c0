//! Syntax highlighting for the REPL.

use std::borrow::Cow;

use minicpu_foundation::Register;
use minicpu_language::Instruction;

const RESET: &str = "\x1b[0m";
const COMMENT: &str = "\x1b[2;3m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const MNEMONIC: &str = "\x1b[1;34m";
const REGISTER: &str = "\x1b[36m";
const COMMAND: &str = "\x1b[32m";

/// Highlighter for MiniCPU assembly and REPL commands.
pub struct AsmHighlighter;

impl AsmHighlighter {
    /// Creates a new highlighter.
    pub const fn new() -> Self {
        Self
    }

    /// Highlight a line of input.
    #[allow(clippy::unused_self)]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                // Comments run to end of line
                ';' => {
                    result.push_str(COMMENT);
                    result.push(c);
                    result.extend(chars.by_ref());
                    result.push_str(RESET);
                }

                // Strings have no escapes
                '"' => {
                    result.push_str(STRING);
                    result.push(c);
                    for next in chars.by_ref() {
                        result.push(next);
                        if next == '"' {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                // Meta commands
                ':' if result.trim().is_empty() => {
                    result.push_str(COMMAND);
                    result.push(c);
                    while let Some(next) = chars.next_if(char::is_ascii_alphabetic) {
                        result.push(next);
                    }
                    result.push_str(RESET);
                }

                // Numbers, optionally signed
                c if c.is_ascii_digit()
                    || (c == '-' && chars.peek().is_some_and(char::is_ascii_digit)) =>
                {
                    result.push_str(NUMBER);
                    result.push(c);
                    while let Some(next) = chars.next_if(char::is_ascii_digit) {
                        result.push(next);
                    }
                    result.push_str(RESET);
                }

                // Words: mnemonics, registers, and function names
                c if c.is_ascii_alphabetic() => {
                    let mut word = String::from(c);
                    while let Some(next) = chars.next_if(char::is_ascii_alphanumeric) {
                        word.push(next);
                    }
                    match Self::word_color(&word) {
                        Some(color) => {
                            result.push_str(color);
                            result.push_str(&word);
                            result.push_str(RESET);
                        }
                        None => result.push_str(&word),
                    }
                }

                _ => result.push(c),
            }
        }

        Cow::Owned(result)
    }

    fn word_color(word: &str) -> Option<&'static str> {
        let lower = word.to_ascii_lowercase();
        if Instruction::MNEMONICS.contains(&lower.as_str()) {
            Some(MNEMONIC)
        } else if Register::from_name(word).is_some() {
            Some(REGISTER)
        } else {
            None
        }
    }
}

impl Default for AsmHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
