//! Integration tests for whole programs
//!
//! Decodes and runs complete assembly programs through the public API.

use minicpu_foundation::{ErrorKind, Register};
use minicpu_language::{Halt, Vm, decode, eval, run_program};

fn run(source: &str) -> (Halt, Vec<String>) {
    let program = decode(source).expect("decode failed");
    run_program(&program).expect("run failed")
}

// =============================================================================
// Reference Programs
// =============================================================================

#[test]
fn add_two_registers() {
    let (halt, out) = run("mov A, 5\nmov B, 3\nadd A, B\nprn A\nstop\n");
    assert_eq!(out, vec!["8"]);
    assert_eq!(halt, Halt::Stopped);
}

#[test]
fn branch_on_less_than() {
    let source = "\
mov A, 1
mov B, 2
cmp A, B
jlt 7
prn \"no\"
stop
prn \"yes\"
stop
";
    let (halt, out) = run(source);
    assert_eq!(out, vec!["yes"]);
    assert_eq!(halt, Halt::Stopped);
}

#[test]
fn call_only_touches_callee_registers() {
    let source = "\
func ADDONE
mov A, 1
ret
start
mov B, 10
call ADDONE
prn B
stop
";
    let program = decode(source).unwrap();
    let mut vm = Vm::new(&program);
    let mut out: Vec<String> = Vec::new();

    assert_eq!(vm.run(&mut out).unwrap(), Halt::Stopped);
    assert_eq!(out, vec!["10"]);
    assert_eq!(vm.state().read_register(Register::A), 1);
    assert_eq!(vm.state().read_register(Register::B), 10);
    assert_eq!(vm.state().stack_depth(), 0);
}

// =============================================================================
// Loops and Functions
// =============================================================================

#[test]
fn countdown_loop() {
    let source = "\
start
mov A, 3
cmp A, 0      ; line 3
je 8
prn A
sub A, 1
jmp 3
prn \"liftoff\"
";
    let (halt, out) = run(source);
    assert_eq!(out, vec!["3", "2", "1", "liftoff"]);
    assert_eq!(halt, Halt::EndOfProgram);
}

#[test]
fn sum_one_to_ten() {
    let source = "\
mov A, 0
mov B, 10
add A, B
sub B, 1
cmp B, 0
jgt 3
prn A
";
    assert_eq!(eval(source).unwrap(), vec!["55"]);
}

#[test]
fn nested_calls_unwind_in_order() {
    let source = "\
func OUTER
prn \"outer in\"
call INNER
prn \"outer out\"
ret
func INNER
prn \"inner\"
ret
start
call OUTER
prn \"done\"
stop
";
    let (_, out) = run(source);
    assert_eq!(out, vec!["outer in", "inner", "outer out", "done"]);
}

#[test]
fn recursive_countdown() {
    let source = "\
func DOWN
cmp A, 0
jle 7
prn A
sub A, 1
call DOWN
ret
start
mov A, 3
call DOWN
prn \"end\"
stop
";
    let (_, out) = run(source);
    assert_eq!(out, vec!["3", "2", "1", "end"]);
}

#[test]
fn popping_the_return_address_derails_ret() {
    let source = "\
func DOUBLE
pop A
add A, A
push A
ret
start
mov B, 21
push B
call DOUBLE
prn \"unreachable\"
stop
";
    // The callee pops the return address (9) instead of the argument, so
    // `ret` pops the doubled value 18 and lands past the end of the program.
    let (halt, out) = run(source);
    assert!(out.is_empty());
    assert_eq!(halt, Halt::EndOfProgram);
}

#[test]
fn functions_run_inline_without_start() {
    let source = "\
prn \"first\"
func NEVER
prn \"body\"
ret
";
    let err = eval(source).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackUnderflow));
}

#[test]
fn runaway_recursion_overflows_the_stack() {
    let err = eval("func F1\ncall F1\nstart\ncall F1\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { .. }));
}

#[test]
fn case_insensitive_program() {
    let source = "START\nMOV a, 2\nCMP A, 2\nJE 6\nPRN \"bad\"\nPrn A\nSTOP\n";
    assert_eq!(eval(source).unwrap(), vec!["2"]);
}
