//! The main REPL implementation.
//!
//! Lines that do not start with `:` are appended to the program buffer.
//! Meta commands run, step, inspect, and persist the buffer and machine.

use std::io::{self, Write};
use std::path::Path;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;
use minicpu_debug::TraceOutput;
use minicpu_foundation::{Error, Register, Result};
use minicpu_language::{Snapshot, Status};

/// What the REPL shows after evaluating a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to show.
    Nothing,
    /// Lines to print.
    Lines(Vec<String>),
    /// The user asked to leave.
    Quit,
}

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (program buffer, machine, tracer).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Prompt prefix; the next line number is appended.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "minicpu".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self.refresh_keywords();
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the prompt prefix.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }

        loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    self.print_error(&e);
                }
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false); // EOF
        };

        if input.trim().is_empty() {
            return Ok(true);
        }

        self.editor.add_history(&input);

        match self.eval(&input) {
            Ok(Reply::Quit) => return Ok(false),
            Ok(Reply::Lines(lines)) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Ok(Reply::Nothing) => {}
            Err(e) => self.print_error(&e),
        }

        Ok(true)
    }

    /// Reads one line of input.
    fn read_input(&mut self) -> Result<Option<String>> {
        let prompt = format!("{}:{}> ", self.prompt, self.session.lines().len() + 1);
        match self.editor.read_line(&prompt)? {
            ReadResult::Line(line) => Ok(Some(line)),
            ReadResult::Interrupted => {
                println!();
                Ok(Some(String::new()))
            }
            ReadResult::Eof => Ok(None),
        }
    }

    /// Evaluates one line of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not decode or a command fails.
    pub fn eval(&mut self, input: &str) -> Result<Reply> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Reply::Nothing);
        }
        if trimmed.starts_with(':') {
            return self.eval_command(trimmed);
        }

        self.session.append_line(input.trim_end())?;
        self.refresh_keywords();
        Ok(Reply::Nothing)
    }

    fn eval_command(&mut self, input: &str) -> Result<Reply> {
        let (command, arg) = match input.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (input, None),
        };

        match command {
            ":run" => self.run_buffer(),
            ":step" => self.step_buffer(),
            ":regs" => Ok(Reply::Lines(vec![format_registers(&self.session.snapshot())])),
            ":stack" => Ok(Reply::Lines(format_stack(&self.session.snapshot()))),
            ":list" => Ok(Reply::Lines(self.listing())),
            ":clear" => {
                self.session.clear();
                self.refresh_keywords();
                Ok(note("buffer cleared"))
            }
            ":load" => {
                let path = require_path(command, arg)?;
                let count = self.session.load_file(Path::new(path))?;
                self.refresh_keywords();
                Ok(note(format!("loaded {count} lines from {path}")))
            }
            ":save" => {
                let path = require_path(command, arg)?;
                self.session.save_file(Path::new(path))?;
                Ok(note(format!(
                    "saved {} lines to {path}",
                    self.session.lines().len()
                )))
            }
            ":dump" => {
                let path = require_path(command, arg)?;
                self.session.dump_state(Path::new(path))?;
                Ok(note(format!("machine state written to {path}")))
            }
            ":trace" => self.trace(arg),
            ":help" => Ok(Reply::Lines(help_lines())),
            ":quit" | ":q" => Ok(Reply::Quit),
            other => Err(Error::command(format!(
                "unknown command {other} (try :help)"
            ))),
        }
    }

    fn run_buffer(&mut self) -> Result<Reply> {
        let mut lines: Vec<String> = Vec::new();
        let report = self.session.run(&mut lines)?;
        lines.push(format!("; {}", report.summary()));
        Ok(Reply::Lines(lines))
    }

    fn step_buffer(&mut self) -> Result<Reply> {
        let mut lines: Vec<String> = Vec::new();
        let report = self.session.step(&mut lines)?;

        let after = match report.status {
            Status::Running => format!("-> {}", self.session.snapshot().pc),
            Status::Halted(halt) => format!("({halt})"),
        };
        lines.push(match (&report.fault, &report.instruction) {
            (Some(fault), _) => format!("; fault: {}", fault.describe()),
            (None, Some(instruction)) => format!("; {:>4}  {instruction}  {after}", report.pc),
            (None, None) => format!("; halted {after}"),
        });
        Ok(Reply::Lines(lines))
    }

    fn trace(&mut self, arg: Option<&str>) -> Result<Reply> {
        let mut words = arg.unwrap_or_default().split_whitespace();
        let subcommand = words.next();
        let rest: Vec<&str> = words.collect();
        let tracer = self.session.tracer_mut();

        match (subcommand, rest.as_slice()) {
            (Some("on"), []) => {
                tracer.set_output(TraceOutput::Stderr);
                tracer.enable();
                Ok(note("tracing on"))
            }
            (Some("off"), []) => {
                tracer.disable();
                Ok(note("tracing off"))
            }
            (Some("clear"), []) => {
                tracer.clear();
                Ok(note("trace history cleared"))
            }
            (Some("last"), args) => {
                let (count, kind) = match args {
                    [] => (DEFAULT_TRACE_LINES, None),
                    [count] => (parse_count(count)?, None),
                    [count, kind] => (parse_count(count)?, Some(*kind)),
                    _ => return Err(trace_usage()),
                };
                if let Some(kind) = kind.filter(|k| !TRACE_EVENT_TYPES.contains(k)) {
                    return Err(Error::command(format!(
                        "unknown event type {kind} (expected one of {})",
                        TRACE_EVENT_TYPES.join(", ")
                    )));
                }
                Ok(trace_lines(tracer.last(count, kind)))
            }
            (Some("step"), [step]) => {
                let step = step
                    .parse()
                    .map_err(|_| Error::command(format!("invalid step number {step}")))?;
                Ok(trace_lines(tracer.step(step)))
            }
            (None, _) => {
                let state = if tracer.is_enabled() { "on" } else { "off" };
                Ok(Reply::Lines(vec![
                    format!("; tracing is {state}"),
                    format!("; {}", tracer.summary()),
                ]))
            }
            _ => Err(trace_usage()),
        }
    }

    fn listing(&self) -> Vec<String> {
        let lines = self.session.lines();
        if lines.is_empty() {
            return vec!["; buffer empty".to_string()];
        }
        let width = lines.len().to_string().len();
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>width$}  {line}", i + 1))
            .collect()
    }

    /// Offers declared function names for completion.
    fn refresh_keywords(&mut self) {
        let names = self
            .session
            .program()
            .map(|program| {
                program
                    .labels()
                    .sorted()
                    .into_iter()
                    .map(|(name, _)| name.to_string())
                    .collect()
            })
            .unwrap_or_default();
        self.editor.set_keywords(names);
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &Error) {
        eprintln!("\x1b[31mError: {}\x1b[0m", error.describe());
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("\x1b[1;36mMiniCPU\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
        println!("Enter instructions to build a program; :help lists commands. Ctrl+D exits.\n");

        let _ = io::stdout().flush();
    }
}

/// A single `;`-prefixed status line.
fn note(message: impl AsRef<str>) -> Reply {
    Reply::Lines(vec![format!("; {}", message.as_ref())])
}

fn require_path<'a>(command: &str, arg: Option<&'a str>) -> Result<&'a str> {
    arg.ok_or_else(|| Error::command(format!("usage: {command} PATH")))
}

/// Renders registers, flags, and program counter on one line.
#[must_use]
pub fn format_registers(snapshot: &Snapshot) -> String {
    let registers: Vec<_> = Register::ALL
        .iter()
        .map(|&r| format!("{r}={}", snapshot.register(r)))
        .collect();
    format!(
        "{}  flags={}  pc={}",
        registers.join(" "),
        snapshot.flags,
        snapshot.pc
    )
}

/// Renders the stack, top first.
#[must_use]
pub fn format_stack(snapshot: &Snapshot) -> Vec<String> {
    if snapshot.stack.is_empty() {
        return vec!["; stack empty".to_string()];
    }
    snapshot
        .stack
        .iter()
        .rev()
        .enumerate()
        .map(|(depth, value)| format!("{depth:>4}  {value}"))
        .collect()
}

const DEFAULT_TRACE_LINES: usize = 10;

const TRACE_EVENT_TYPES: [&str; 4] = ["step", "output", "halt", "fault"];

fn trace_usage() -> Error {
    Error::command("usage: :trace [on|off|clear|last [N] [TYPE]|step K]")
}

fn parse_count(text: &str) -> Result<usize> {
    text.parse()
        .map_err(|_| Error::command(format!("invalid record count {text}")))
}

fn trace_lines(lines: Vec<String>) -> Reply {
    if lines.is_empty() {
        note("no matching trace records")
    } else {
        Reply::Lines(lines)
    }
}

fn help_lines() -> Vec<String> {
    [
        "Lines without a leading ':' are appended to the program.",
        "Jump operands are line numbers, as shown by :list.",
        "",
        "  :run            run the program from the start",
        "  :step           execute one instruction",
        "  :regs           show registers, flags, and pc",
        "  :stack          show the stack, top first",
        "  :list           list the program with line numbers",
        "  :clear          empty the program",
        "  :load PATH      replace the program with a file",
        "  :save PATH      write the program to a file",
        "  :dump PATH      write the machine state (MessagePack)",
        "  :trace on|off   trace executed instructions to stderr",
        "  :trace last [N] [TYPE]  show the last N trace records",
        "  :trace step K   show the trace records of step K",
        "  :trace clear    forget recorded trace history",
        "  :help           show this help",
        "  :quit           exit",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}
