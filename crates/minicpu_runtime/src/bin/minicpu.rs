//! MiniCPU CLI entry point.

use minicpu_debug::{Tracer, TracerConfig};
use minicpu_language::WriterSink;
use minicpu_runtime::{
    DEFAULT_REPL_STEP_LIMIT, Repl, RunOptions, RunReport, Session, StateDump, run_file,
    save_to_file,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    trace: bool,
    trace_json: bool,
    max_steps: Option<u64>,
    stack_capacity: Option<usize>,
    dump_state: Option<PathBuf>,
}

impl CliConfig {
    fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new();
        if let Some(capacity) = self.stack_capacity {
            options = options.with_stack_capacity(capacity);
        }
        if let Some(max_steps) = self.max_steps {
            options = options.with_max_steps(max_steps);
        }
        options
    }

    fn tracer(&self) -> Tracer {
        if !(self.trace || self.trace_json) {
            return Tracer::disabled();
        }
        let config = TracerConfig::new().enabled().to_stderr();
        Tracer::new(if self.trace_json { config.json() } else { config })
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--trace" => config.trace = true,
            "--trace-json" => config.trace_json = true,
            "--max-steps" => {
                let value = args.next().ok_or("--max-steps requires a value")?;
                config.max_steps = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid --max-steps value: {value}"))?,
                );
            }
            "--stack-capacity" => {
                let value = args.next().ok_or("--stack-capacity requires a value")?;
                config.stack_capacity = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid --stack-capacity value: {value}"))?,
                );
            }
            "--dump-state" => {
                let value = args.next().ok_or("--dump-state requires a path")?;
                config.dump_state = Some(PathBuf::from(value));
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("minicpu {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let options = config.run_options();
    let mut tracer = config.tracer();
    let mut last: Option<RunReport> = None;

    for file in &config.files {
        let mut out = WriterSink::stdout();
        tracer.reset_steps();
        let report = run_file(file, &options, &mut out, &mut tracer).map_err(|e| e.describe())?;

        if report.hit_step_limit() {
            eprintln!(
                "\x1b[33m{}: {}\x1b[0m",
                file.display(),
                report.summary()
            );
        }
        let failed = report.fault.is_some();
        last = Some(report);
        if failed {
            break;
        }
    }

    if let (Some(path), Some(report)) = (&config.dump_state, &last) {
        save_to_file(&StateDump::new(report.snapshot.clone(), report.steps), path)
            .map_err(|e| e.describe())?;
    }

    if let Some(fault) = last.and_then(|report| report.fault) {
        return Err(fault.describe().into());
    }

    if config.batch_mode {
        return Ok(());
    }

    // The REPL keeps a step budget even when batch runs have none.
    let mut options = options;
    options.max_steps = options.max_steps.or(Some(DEFAULT_REPL_STEP_LIMIT));
    let mut session = Session::with_options(options);
    session.set_tracer(tracer);
    if let Some(file) = config.files.last() {
        session.load_file(file).map_err(|e| e.describe())?;
    }

    let mut repl = Repl::new()?.with_session(session);
    if !config.files.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mMiniCPU\x1b[0m - A four-register virtual CPU

\x1b[1mUSAGE:\x1b[0m
    minicpu [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Assembly files to run before starting the REPL

\x1b[1mOPTIONS:\x1b[0m
    -h, --help             Print help information
    -V, --version          Print version information
    -b, --batch            Run files and exit (no REPL)

\x1b[1mEXECUTION OPTIONS:\x1b[0m
    --max-steps N          Stop a program after N steps
    --stack-capacity N     Stack capacity in words (default 65536)
    --dump-state PATH      Write the final machine state (MessagePack)

\x1b[1mDEBUG OPTIONS:\x1b[0m
    --trace                Trace executed instructions to stderr
    --trace-json           Trace as JSON lines

\x1b[1mEXAMPLES:\x1b[0m
    minicpu                          Start interactive REPL
    minicpu -b prog.asm              Run prog.asm and exit
    minicpu --trace -b prog.asm      Run with instruction tracing
    minicpu prog.asm                 Run prog.asm, then edit it in the REPL

\x1b[1mREPL COMMANDS:\x1b[0m
    mov A, 1             Append an instruction to the program
    :run                 Run the program from the start
    :step                Execute one instruction
    :regs / :stack       Inspect the machine
    :list                List the program with line numbers
    :load / :save PATH   Read or write the program
    :dump PATH           Write the machine state
    :trace on|off        Toggle instruction tracing
    Ctrl+D               Exit REPL"
    );
}
