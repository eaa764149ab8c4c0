//! Integration tests for machine state dumps

use minicpu_foundation::{ErrorKind, Register};
use minicpu_language::{NoObserver, Vm, decode};
use minicpu_runtime::{
    RunOptions, StateDump, from_bytes, load_from_file, run_source, save_to_file, to_bytes,
};

#[test]
fn dump_of_a_run_reloads_into_a_vm() {
    let source = "mov A, 6\npush A\nmov B, 2\ncmp A, B\nprn B\nstop\n";
    let options = RunOptions::new().with_max_steps(4);
    let mut out: Vec<String> = Vec::new();
    let report = run_source("dump.asm", source, &options, &mut out, &mut NoObserver).unwrap();
    assert!(report.hit_step_limit());

    let path = std::env::temp_dir().join(format!("minicpu_it_dump_{}.msgpack", std::process::id()));
    save_to_file(&StateDump::new(report.snapshot.clone(), report.steps), &path).unwrap();
    let dump = load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(dump.steps, 4);
    assert_eq!(dump.snapshot, report.snapshot);
    assert!(dump.snapshot.flags.greater);

    // The dump resumes exactly where the budget ran out.
    let program = decode(source).unwrap();
    let mut vm = Vm::new(&program);
    vm.restore(&dump.snapshot).unwrap();
    let mut resumed: Vec<String> = Vec::new();
    vm.run(&mut resumed).unwrap();
    assert_eq!(resumed, vec!["2"]);
    assert_eq!(vm.state().read_register(Register::A), 6);
    assert_eq!(vm.state().stack(), &[6]);
}

#[test]
fn dump_keeps_field_names() {
    let bytes = to_bytes(&StateDump::new(Default::default(), 0)).unwrap();
    for field in ["version", "steps", "snapshot", "registers", "flags", "stack", "pc"] {
        assert!(
            bytes.windows(field.len()).any(|w| w == field.as_bytes()),
            "missing {field}"
        );
    }
    assert_eq!(from_bytes(&bytes).unwrap().steps, 0);
}

#[test]
fn truncated_dump_is_rejected() {
    let bytes = to_bytes(&StateDump::new(Default::default(), 12)).unwrap();
    let err = from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}
