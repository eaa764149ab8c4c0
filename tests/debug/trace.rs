//! Integration tests for the tracer
//!
//! Drives a real VM with the tracer attached and checks what it records
//! and how records are rendered.

use minicpu_debug::{
    HumanFormatter, JsonFormatter, TraceEvent, TraceFormatter, TraceRecord, Tracer, TracerConfig,
};
use minicpu_language::{Halt, Status, Vm, decode};

fn trace(source: &str, config: TracerConfig) -> (Tracer, Vec<String>) {
    let program = decode(source).expect("decode failed");
    let mut tracer = Tracer::new(config);
    let mut out: Vec<String> = Vec::new();
    let _ = Vm::new(&program).run_observed(&mut out, &mut tracer);
    (tracer, out)
}

fn enabled() -> TracerConfig {
    TracerConfig::new().enabled()
}

// =============================================================================
// Recording
// =============================================================================

#[test]
fn records_follow_execution_order() {
    let (tracer, out) = trace("start\nprn \"hi\"\nstop", enabled());

    assert_eq!(out, vec!["hi"]);
    let events: Vec<_> = tracer
        .buffer()
        .iter()
        .map(|r| (r.step, r.event_type(), r.event.pc()))
        .collect();
    assert_eq!(
        events,
        vec![
            (1, "step", 0),
            (2, "output", 1),
            (2, "step", 1),
            (3, "step", 2),
            (3, "halt", 2),
        ]
    );
}

#[test]
fn falling_off_the_end_is_a_halt() {
    let (tracer, _) = trace("mov A, 1", enabled());
    let last = tracer.buffer().last().unwrap();
    assert_eq!(
        last.event,
        TraceEvent::Halt {
            pc: 1,
            reason: Halt::EndOfProgram
        }
    );
    assert!(last.event.is_terminal());
}

#[test]
fn jumps_record_their_destination() {
    let (tracer, _) = trace("jmp 3\nmov A, 1\nstop", enabled());
    let steps = tracer.buffer().by_event_type("step");
    assert!(matches!(
        steps[0].event,
        TraceEvent::Step { pc: 0, next: Some(2), .. }
    ));
    assert!(matches!(
        steps[1].event,
        TraceEvent::Step { pc: 2, next: None, .. }
    ));
}

#[test]
fn calls_show_stack_depth() {
    let source = "func F1\nret\nstart\ncall F1\nstop";
    let (tracer, _) = trace(source, enabled());
    let depths: Vec<_> = tracer
        .buffer()
        .by_event_type("step")
        .iter()
        .filter_map(|r| match r.event {
            TraceEvent::Step { stack_depth, .. } => Some(stack_depth),
            _ => None,
        })
        .collect();
    // start, call, ret, stop
    assert_eq!(depths, vec![0, 1, 0, 0]);
}

#[test]
fn fault_is_recorded_before_halt() {
    let (tracer, _) = trace("mov A, 9223372036854775807\nadd A, 1", enabled());
    let types: Vec<_> = tracer.buffer().iter().map(TraceRecord::event_type).collect();
    assert_eq!(types, vec!["step", "fault", "halt"]);

    let fault = &tracer.buffer().by_event_type("fault")[0];
    assert_eq!(fault.step, 2);
    assert_eq!(fault.event.pc(), 1);
}

#[test]
fn small_buffer_keeps_the_latest_records() {
    let (tracer, _) = trace(
        "start\nadd A, 1\nadd A, 1\nadd A, 1\nstop",
        enabled().with_buffer_size(2),
    );
    assert_eq!(tracer.buffer().len(), 2);
    let types: Vec<_> = tracer.buffer().iter().map(TraceRecord::event_type).collect();
    assert_eq!(types, vec!["step", "halt"]);
    assert_eq!(tracer.steps(), 5);
}

#[test]
fn step_count_spans_budgeted_runs() {
    let program = decode("start\nadd A, 1\njmp 2").unwrap();
    let mut vm = Vm::new(&program);
    let mut tracer = Tracer::new(enabled());

    let status = vm.run_for(&mut Vec::<String>::new(), &mut tracer, 4).unwrap();
    assert_eq!(status, Status::Running);
    vm.run_for(&mut Vec::<String>::new(), &mut tracer, 3).unwrap();

    assert_eq!(tracer.steps(), 7);
    assert_eq!(tracer.buffer().step_range(), Some((1, 7)));
    assert_eq!(tracer.buffer().for_step(4).len(), 1);
}

#[test]
fn disabled_tracer_still_counts() {
    let (tracer, _) = trace("start\nstop", TracerConfig::new());
    assert!(tracer.buffer().is_empty());
    assert_eq!(tracer.steps(), 2);
}

// =============================================================================
// Formatting
// =============================================================================

#[test]
fn human_format_shows_machine_state() {
    let (tracer, _) = trace("mov A, 1\ncmp A, 2", enabled());
    let records: Vec<_> = tracer.buffer().iter().collect();
    let formatter = HumanFormatter::new();

    let first = formatter.format(records[0]);
    assert!(first.starts_with("S0001    0  mov A, 1"), "{first}");
    assert!(first.ends_with("-> 1    A=1 B=0 C=0 D=0 flags=--- sp=0"), "{first}");

    let second = formatter.format(records[1]);
    assert!(second.contains("flags=-L-"), "{second}");

    let halt = formatter.format(records[2]);
    assert_eq!(halt, "S0002    2  HALT (end of program)");
}

#[test]
fn human_format_output_and_fault() {
    let (tracer, _) = trace("prn \"x\"\npop B", enabled());
    let formatter = HumanFormatter::new();
    let rendered: Vec<_> = tracer.buffer().iter().map(|r| formatter.format(r)).collect();

    assert_eq!(rendered[0], "S0001    0  OUT x");
    assert_eq!(rendered[2], "S0002    1  FAULT stack underflow");
}

#[test]
fn json_format_is_one_object_per_record() {
    let (tracer, _) = trace("prn \"a\tb\"", enabled().json());
    let records: Vec<_> = tracer.buffer().iter().collect();
    let formatter = JsonFormatter::new();

    let output = formatter.format(records[0]);
    assert!(output.starts_with("{\"id\":0,\"step\":1,"), "{output}");
    assert!(output.contains("\"type\":\"output\""));
    assert!(output.ends_with("\"line\":\"a\\tb\"}"), "{output}");

    let halt = formatter.format(records[2]);
    assert!(halt.ends_with("\"type\":\"halt\",\"pc\":1,\"reason\":\"end of program\"}"));

    let lines = tracer.last(10, None);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.starts_with("{\"id\":")));
}
