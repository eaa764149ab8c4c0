//! Line editor abstraction for the REPL.
//!
//! The REPL talks to a [`LineEditor`] rather than to rustyline directly, so
//! tests can drive it with scripted input.

use std::borrow::Cow;

use crate::highlight::AsmHighlighter;
use minicpu_foundation::{Error, ErrorKind, Register, Result};
use minicpu_language::Instruction;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter};

/// Meta commands understood by the REPL.
pub const META_COMMANDS: [&str; 12] = [
    ":run", ":step", ":regs", ":stack", ":list", ":clear", ":load", ":save", ":dump", ":trace",
    ":help", ":quit",
];

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was successfully read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D (EOF).
    Eof,
}

/// Abstraction over line editing functionality.
pub trait LineEditor {
    /// Read a line with the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Add a line to history.
    fn add_history(&mut self, line: &str);

    /// Set extra completion candidates, such as declared function names.
    fn set_keywords(&mut self, keywords: Vec<String>);
}

/// Helper for rustyline that provides completion, hints, and highlighting.
#[derive(Helper, Completer, Hinter)]
struct AsmHelper {
    #[rustyline(Completer)]
    completer: AsmCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    highlighter: AsmHighlighter,
}

impl Validator for AsmHelper {}

impl Highlighter for AsmHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completer for mnemonics, registers, meta commands, and file paths.
struct AsmCompleter {
    file_completer: FilenameCompleter,
    keywords: Vec<String>,
}

impl AsmCompleter {
    fn new() -> Self {
        Self {
            file_completer: FilenameCompleter::new(),
            keywords: default_keywords(),
        }
    }

    fn candidates(&self, word: &str) -> Vec<Pair> {
        let lower = word.to_ascii_lowercase();
        self.keywords
            .iter()
            .filter(|kw| kw.to_ascii_lowercase().starts_with(&lower))
            .map(|kw| Pair {
                display: kw.clone(),
                replacement: kw.clone(),
            })
            .collect()
    }
}

/// Mnemonics, register names, and meta commands.
#[must_use]
pub fn default_keywords() -> Vec<String> {
    Instruction::MNEMONICS
        .iter()
        .map(ToString::to_string)
        .chain(Register::ALL.iter().map(ToString::to_string))
        .chain(META_COMMANDS.iter().map(ToString::to_string))
        .collect()
}

/// Returns true if the cursor is on the path argument of a file command.
fn completing_path(line: &str) -> bool {
    let mut words = line.split_whitespace();
    matches!(words.next(), Some(":load" | ":save" | ":dump"))
        && (line.ends_with(char::is_whitespace) || words.next().is_some())
}

impl Completer for AsmCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if completing_path(&line[..pos]) {
            return self.file_completer.complete(line, pos, ctx);
        }

        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == ',')
            .map_or(0, |i| i + 1);

        Ok((start, self.candidates(&line[start..pos])))
    }
}

/// Line editor implementation using rustyline.
pub struct RustylineEditor {
    editor: Editor<AsmHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a new rustyline-based editor.
    ///
    /// # Errors
    ///
    /// Returns an error if rustyline initialization fails.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?
            .build();

        let helper = AsmHelper {
            completer: AsmCompleter::new(),
            hinter: HistoryHinter::new(),
            highlighter: AsmHighlighter::new(),
        };

        let mut editor = Editor::with_config(config)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::io(e.to_string())),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            let mut all = default_keywords();
            all.extend(keywords);
            helper.completer.keywords = all;
        }
    }
}
