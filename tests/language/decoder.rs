//! Integration tests for the decoder
//!
//! Tests the assembly text format: operands, comments, labels, jump
//! resolution, and error reporting.

use minicpu_foundation::{ErrorKind, Register};
use minicpu_language::{
    Condition, Instruction, Lexer, Operand, PrintArg, TokenKind, decode,
};

fn instructions(source: &str) -> Vec<Instruction> {
    decode(source).expect("decode failed").instructions().to_vec()
}

fn decode_err(source: &str) -> ErrorKind {
    decode(source).expect_err("decode should fail").kind
}

// =============================================================================
// Lexing
// =============================================================================

#[test]
fn lexer_splits_words_strings_and_commas() {
    let kinds: Vec<_> = Lexer::tokenize_all("mov A, 5 ; note\nprn \"hi there\"")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Word("mov".into()),
            TokenKind::Word("A".into()),
            TokenKind::Comma,
            TokenKind::Word("5".into()),
            TokenKind::Newline,
            TokenKind::Word("prn".into()),
            TokenKind::Str("hi there".into()),
            TokenKind::Eof,
        ]
    );
}

// =============================================================================
// Operands
// =============================================================================

#[test]
fn decode_every_operand_shape() {
    let decoded = instructions(
        "mov A, B\nadd C, -4\nsub D, 0\ncmp A, 9\nprn A\nprn \"text\"\npush B\npop C\n",
    );
    assert_eq!(
        decoded,
        vec![
            Instruction::Mov(Register::A, Operand::Register(Register::B)),
            Instruction::Add(Register::C, Operand::Literal(-4)),
            Instruction::Sub(Register::D, Operand::Literal(0)),
            Instruction::Cmp(Register::A, Operand::Literal(9)),
            Instruction::Prn(PrintArg::Register(Register::A)),
            Instruction::Prn(PrintArg::Text("text".into())),
            Instruction::Push(Register::B),
            Instruction::Pop(Register::C),
        ]
    );
}

#[test]
fn commas_are_optional() {
    assert_eq!(instructions("mov A 1"), instructions("mov A, 1"));
}

#[test]
fn every_condition_decodes() {
    for condition in Condition::ALL {
        let decoded = instructions(&format!("{} 1", condition.mnemonic()));
        assert_eq!(decoded, vec![Instruction::Branch(condition, 0)]);
    }
}

#[test]
fn literal_extremes() {
    let decoded = instructions(&format!("mov A, {}\nmov B, {}", i64::MAX, i64::MIN));
    assert_eq!(
        decoded,
        vec![
            Instruction::Mov(Register::A, Operand::Literal(i64::MAX)),
            Instruction::Mov(Register::B, Operand::Literal(i64::MIN)),
        ]
    );
}

// =============================================================================
// Labels and Jumps
// =============================================================================

#[test]
fn function_labels_are_upper_cased() {
    let program = decode("func helper\nret\nstart\ncall Helper\nstop").unwrap();
    assert_eq!(program.labels().resolve("HELPER"), Some(1));
    assert_eq!(program.labels().resolve("helper"), Some(1));
    assert_eq!(program.entry_point(), 2);
    assert_eq!(
        program.instructions()[3],
        Instruction::Call("HELPER".into())
    );
}

#[test]
fn jumps_skip_blank_and_comment_lines() {
    let source = "\
start
jmp 4

; nothing here
stop
";
    let program = decode(source).unwrap();
    assert_eq!(program.instructions()[1], Instruction::Jmp(2));
    assert_eq!(program.source_line(2), Some(5));
}

#[test]
fn jump_past_the_end_is_allowed() {
    let program = decode("jmp 99\nstop").unwrap();
    assert_eq!(program.instructions()[0], Instruction::Jmp(2));
}

#[test]
fn to_source_redecodes_identically() {
    let source = "\
func TWICE
add A, A
ret

start
mov A, 3
call TWICE
cmp A, 6      ; is it six?
jne 11
prn \"six\"
stop
";
    let program = decode(source).unwrap();
    let again = decode(&program.to_source()).unwrap();
    assert_eq!(again.instructions(), program.instructions());
    assert_eq!(again.labels(), program.labels());
}

#[test]
fn listing_shows_addresses() {
    let program = decode("start\njmp 1").unwrap();
    assert_eq!(program.listing(), "0  start\n1  jmp @0");
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unknown_opcode() {
    assert!(matches!(decode_err("nop"), ErrorKind::UnknownOpcode(ref op) if op == "nop"));
}

#[test]
fn wrong_arity() {
    assert!(matches!(
        decode_err("mov A"),
        ErrorKind::ArityMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
    assert!(matches!(decode_err("ret A"), ErrorKind::ArityMismatch { .. }));
}

#[test]
fn bad_operands() {
    for source in ["mov 5, A", "push 3", "jmp A", "call 7", "prn 12", "add A, 1x"] {
        assert!(
            matches!(decode_err(source), ErrorKind::InvalidOperand { .. }),
            "{source}"
        );
    }
}

#[test]
fn bad_jump_targets() {
    for source in ["jmp 0", "je -2"] {
        assert!(
            matches!(decode_err(source), ErrorKind::InvalidJumpTarget(_)),
            "{source}"
        );
    }
}

#[test]
fn duplicate_function_names_ignore_case() {
    assert!(matches!(
        decode_err("func F1\nret\nfunc f1\nret"),
        ErrorKind::DuplicateLabel(_)
    ));
}

#[test]
fn unterminated_string_is_a_parse_error() {
    let err = decode("mov A, 1\nprn \"open").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse { line: 2, .. }));
}

#[test]
fn errors_carry_source_position() {
    let err = decode("start\n\n  frob A").unwrap_err();
    let context = err.context.expect("position attached");
    assert_eq!(context.line, Some(3));
    assert_eq!(context.column, Some(3));
}
