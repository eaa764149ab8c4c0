//! Property tests for instruction semantics
//!
//! Each property runs a small generated program and compares the machine
//! against plain integer arithmetic.

use std::fmt::Write as _;

use minicpu_foundation::{ErrorKind, Register};
use minicpu_language::{Condition, Flags, Vm, decode, eval};
use proptest::prelude::*;

fn arb_register() -> impl Strategy<Value = Register> {
    prop::sample::select(Register::ALL.to_vec())
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop::sample::select(Condition::ALL.to_vec())
}

proptest! {
    #[test]
    fn mov_then_read(reg in arb_register(), value in any::<i64>()) {
        let program = decode(&format!("mov {reg}, {value}")).unwrap();
        let mut vm = Vm::new(&program);
        vm.run(&mut Vec::<String>::new()).unwrap();
        prop_assert_eq!(vm.state().read_register(reg), value);
    }

    #[test]
    fn add_matches_checked_add(a in any::<i64>(), b in any::<i64>()) {
        let program = decode(&format!("mov A, {a}\nmov B, {b}\nadd A, B")).unwrap();
        let mut vm = Vm::new(&program);
        let result = vm.run(&mut Vec::<String>::new());

        match a.checked_add(b) {
            Some(sum) => {
                prop_assert!(result.is_ok());
                prop_assert_eq!(vm.state().read_register(Register::A), sum);
            }
            None => {
                let err = result.unwrap_err();
                let is_overflow = matches!(err.kind, ErrorKind::ArithmeticOverflow { .. });
                prop_assert!(is_overflow);
                prop_assert_eq!(vm.state().read_register(Register::A), a);
            }
        }
    }

    #[test]
    fn sub_matches_checked_sub(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let out = eval(&format!("mov C, {a}\nsub C, {b}\nprn C")).unwrap();
        prop_assert_eq!(out, vec![(a - b).to_string()]);
    }

    #[test]
    fn conditional_jumps_agree_with_comparison(
        a in -50i64..50,
        b in -50i64..50,
        condition in arb_condition(),
    ) {
        let source = format!(
            "mov A, {a}\nmov B, {b}\ncmp A, B\n{} 7\nprn \"no\"\nstop\nprn \"yes\"\nstop",
            condition.mnemonic()
        );
        let out = eval(&source).unwrap();
        let expected = if condition.holds(Flags::compare(a, b)) { "yes" } else { "no" };
        prop_assert_eq!(out, vec![expected.to_string()]);
    }

    #[test]
    fn pop_returns_pushes_in_reverse(values in prop::collection::vec(any::<i64>(), 1..16)) {
        let mut source = String::new();
        for value in &values {
            writeln!(source, "mov A, {value}\npush A").unwrap();
        }
        for _ in &values {
            source.push_str("pop B\nprn B\n");
        }

        let out = eval(&source).unwrap();
        let expected: Vec<String> = values.iter().rev().map(ToString::to_string).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn push_then_pop_leaves_the_stack_as_it_was(
        below in prop::collection::vec(any::<i64>(), 0..16),
        value in any::<i64>(),
    ) {
        let mut source = String::new();
        for item in &below {
            writeln!(source, "mov C, {item}\npush C").unwrap();
        }
        writeln!(source, "mov A, {value}\npush A\npop B").unwrap();

        let program = decode(&source).unwrap();
        let mut vm = Vm::new(&program);
        vm.run(&mut Vec::<String>::new()).unwrap();
        prop_assert_eq!(vm.state().stack_depth(), below.len());
        prop_assert_eq!(vm.state().stack(), below.as_slice());
        prop_assert_eq!(vm.state().read_register(Register::B), value);
    }

    #[test]
    fn nested_calls_unwind_last_in_first_out(depth in 1usize..10) {
        let mut source = String::new();
        for level in 1..=depth {
            writeln!(source, "func F{level}\nprn \"in {level}\"").unwrap();
            if level < depth {
                writeln!(source, "call F{}", level + 1).unwrap();
            }
            writeln!(source, "prn \"out {level}\"\nret").unwrap();
        }
        source.push_str("start\ncall F1\nstop\n");

        let program = decode(&source).unwrap();
        let mut vm = Vm::new(&program);
        let mut out: Vec<String> = Vec::new();
        vm.run(&mut out).unwrap();

        let mut expected: Vec<String> = (1..=depth).map(|l| format!("in {l}")).collect();
        expected.extend((1..=depth).rev().map(|l| format!("out {l}")));
        prop_assert_eq!(out, expected);
        prop_assert_eq!(vm.state().stack_depth(), 0);
    }

    #[test]
    fn cmp_leaves_registers_alone(a in any::<i64>(), b in any::<i64>()) {
        let program = decode(&format!("mov A, {a}\nmov D, {b}\ncmp A, D")).unwrap();
        let mut vm = Vm::new(&program);
        vm.run(&mut Vec::<String>::new()).unwrap();
        prop_assert_eq!(vm.state().read_register(Register::A), a);
        prop_assert_eq!(vm.state().read_register(Register::D), b);
        prop_assert_eq!(vm.state().flags(), Flags::compare(a, b));
    }
}

#[test]
fn empty_stack_underflows() {
    for source in ["pop A", "ret", "start\nret"] {
        let err = eval(source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::StackUnderflow), "{source}");
    }
}
