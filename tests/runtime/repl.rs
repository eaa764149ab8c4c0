//! Scripted REPL sessions
//!
//! Drives the REPL loop with a canned editor and inspects the session it
//! leaves behind.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use minicpu_foundation::{ErrorKind, Register, Result};
use minicpu_language::{Halt, Status};
use minicpu_runtime::{LineEditor, ReadResult, Repl, Reply, RunOptions, Session};

#[derive(Default)]
struct Script {
    inputs: VecDeque<ReadResult>,
    prompts: Vec<String>,
    history: Vec<String>,
    keywords: Vec<String>,
}

/// Editor that replays scripted input and records what the REPL asks of it.
#[derive(Clone, Default)]
struct ScriptedEditor(Rc<RefCell<Script>>);

impl ScriptedEditor {
    fn new(lines: &[&str]) -> Self {
        let editor = Self::default();
        editor.0.borrow_mut().inputs = lines
            .iter()
            .map(|line| ReadResult::Line((*line).to_string()))
            .collect();
        editor
    }

    fn push(&self, input: ReadResult) {
        self.0.borrow_mut().inputs.push_back(input);
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        let mut script = self.0.borrow_mut();
        script.prompts.push(prompt.to_string());
        Ok(script.inputs.pop_front().unwrap_or(ReadResult::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.0.borrow_mut().history.push(line.to_string());
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        self.0.borrow_mut().keywords = keywords;
    }
}

fn run_script(lines: &[&str]) -> (Repl<ScriptedEditor>, ScriptedEditor) {
    let editor = ScriptedEditor::new(lines);
    let mut repl = Repl::with_editor(editor.clone()).without_banner();
    repl.run().unwrap();
    (repl, editor)
}

#[test]
fn prompt_tracks_the_next_line_number() {
    let (_, editor) = run_script(&["start", "bogus", "mov A, 1", ":list"]);
    let script = editor.0.borrow();
    assert_eq!(
        script.prompts,
        vec![
            "minicpu:1> ",
            "minicpu:2> ",
            "minicpu:2> ",
            "minicpu:3> ",
            "minicpu:3> ",
        ]
    );
    assert_eq!(script.history, vec!["start", "bogus", "mov A, 1", ":list"]);
}

#[test]
fn interrupt_and_blank_lines_are_skipped() {
    let editor = ScriptedEditor::new(&["mov A, 1", "   "]);
    editor.push(ReadResult::Interrupted);
    editor.push(ReadResult::Line("prn A".into()));

    let mut repl = Repl::with_editor(editor.clone()).without_banner();
    repl.run().unwrap();

    assert_eq!(repl.session().lines(), ["mov A, 1", "prn A"]);
    assert_eq!(editor.0.borrow().history, vec!["mov A, 1", "prn A"]);
}

#[test]
fn session_runs_what_was_typed() {
    let (mut repl, editor) = run_script(&[
        "func SQUARE",
        "mov B, A",
        "mov C, 0",
        "add C, A",
        "sub B, 1",
        "cmp B, 0",
        "jgt 4",
        "mov A, C",
        "ret",
        "start",
        "mov A, 7",
        "call square",
        "prn A",
        "stop",
        ":run",
    ]);

    assert_eq!(editor.0.borrow().keywords, vec!["SQUARE"]);
    let session = repl.session();
    assert_eq!(session.status(), Status::Halted(Halt::Stopped));
    assert_eq!(session.snapshot().register(Register::A), 49);

    let Reply::Lines(out) = repl.eval(":run").unwrap() else {
        panic!("expected output");
    };
    assert_eq!(out[0], "49");
}

#[test]
fn step_continues_after_run_hits_its_budget() {
    let session = Session::with_options(RunOptions::new().with_max_steps(3));
    let mut repl = Repl::with_editor(ScriptedEditor::default())
        .without_banner()
        .with_session(session);

    for line in ["mov A, 1", "add A, 1", "add A, 1", "add A, 1", "stop"] {
        repl.eval(line).unwrap();
    }
    let Reply::Lines(out) = repl.eval(":run").unwrap() else {
        panic!("expected summary");
    };
    assert_eq!(out, vec!["; step limit reached after 3 steps"]);
    assert_eq!(repl.session().snapshot().register(Register::A), 3);

    let Reply::Lines(out) = repl.eval(":step").unwrap() else {
        panic!("expected step line");
    };
    assert_eq!(out, vec![";    3  add A, 1  -> 4"]);
    assert_eq!(repl.session().snapshot().register(Register::A), 4);
    assert_eq!(repl.session().steps(), 4);
}

#[test]
fn editing_resets_the_machine() {
    let mut repl = Repl::with_editor(ScriptedEditor::default()).without_banner();
    repl.eval("mov D, 5").unwrap();
    repl.eval(":run").unwrap();
    assert_eq!(repl.session().snapshot().register(Register::D), 5);

    repl.eval("mov D, 6").unwrap();
    assert_eq!(repl.session().status(), Status::Running);
    assert_eq!(repl.session().snapshot().register(Register::D), 0);
    assert_eq!(repl.session().steps(), 0);
}

#[test]
fn forward_jumps_can_be_typed_before_their_target() {
    let mut repl = Repl::with_editor(ScriptedEditor::default()).without_banner();
    repl.eval("jmp 3").unwrap();
    repl.eval("prn \"skipped\"").unwrap();
    repl.eval("prn \"landed\"").unwrap();

    let Reply::Lines(out) = repl.eval(":run").unwrap() else {
        panic!("expected output");
    };
    assert_eq!(out, vec!["landed", "; end of program after 2 steps"]);
}

#[test]
fn faults_are_shown_not_raised() {
    let mut repl = Repl::with_editor(ScriptedEditor::default()).without_banner();
    repl.eval("call MISSING").unwrap();

    let Reply::Lines(out) = repl.eval(":run").unwrap() else {
        panic!("expected fault line");
    };
    assert!(out[0].starts_with("; fault: unresolved label"), "{}", out[0]);

    let err = repl.eval("func 9lives").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidOperand { .. }));
}

fn reply_lines(reply: Reply) -> Vec<String> {
    match reply {
        Reply::Lines(lines) => lines,
        other => panic!("expected lines, got {other:?}"),
    }
}

#[test]
fn trace_history_is_browsable_after_a_run() {
    let mut repl = Repl::with_editor(ScriptedEditor::default()).without_banner();
    for line in ["mov A, 2", "prn A", "add A, 1", "prn A"] {
        repl.eval(line).unwrap();
    }
    assert_eq!(reply_lines(repl.eval(":trace on").unwrap()), vec!["; tracing on"]);
    assert_eq!(
        reply_lines(repl.eval(":run").unwrap()),
        vec!["2", "3", "; end of program after 4 steps"]
    );

    assert_eq!(
        reply_lines(repl.eval(":trace last 2 output").unwrap()),
        vec!["S0002    1  OUT 2", "S0004    3  OUT 3"]
    );
    assert_eq!(
        reply_lines(repl.eval(":trace step 3").unwrap()),
        vec!["S0003    2  add A, 1             -> 3    A=3 B=0 C=0 D=0 flags=--- sp=0"]
    );
    let all = reply_lines(repl.eval(":trace last").unwrap());
    assert_eq!(all.len(), 7);
    assert_eq!(all[6], "S0004    4  HALT (end of program)");
    assert_eq!(
        reply_lines(repl.eval(":trace last 1 fault").unwrap()),
        vec!["; no matching trace records"]
    );

    let summary = "; 7/10000 records, steps 1-4, 1 halt, 2 output, 4 step";
    assert_eq!(
        reply_lines(repl.eval(":trace").unwrap()),
        vec!["; tracing is on", summary]
    );

    // A second run replaces the history instead of appending to it.
    repl.eval(":run").unwrap();
    assert_eq!(reply_lines(repl.eval(":trace").unwrap())[1], summary);
}

#[test]
fn trace_step_numbers_continue_across_single_steps() {
    let mut repl = Repl::with_editor(ScriptedEditor::default()).without_banner();
    repl.eval("mov B, 1").unwrap();
    repl.eval("prn B").unwrap();
    repl.session_mut().tracer_mut().enable();

    repl.eval(":step").unwrap();
    repl.eval(":step").unwrap();

    assert_eq!(
        reply_lines(repl.eval(":trace step 2").unwrap()),
        vec![
            "S0002    1  OUT 1",
            "S0002    1  prn B                -> 2    A=0 B=1 C=0 D=0 flags=--- sp=0",
        ]
    );
    let err = repl.eval(":trace step two").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Command(_)));
}
