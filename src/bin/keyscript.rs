//! CLI entry point. Wires a script file into an [`Interpreter`] running
//! against a [`ConsoleActionSink`], the way the teacher's `why.rs` wires a
//! source file into its own compiler pipeline.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use keyscript::action::ConsoleActionSink;
use keyscript::config::RunConfig;
use keyscript::interpreter::Interpreter;

#[derive(Parser)]
#[command(name = "keyscript", about = "Run a keystroke-injection script")]
struct Args {
    /// Script file to execute.
    file: PathBuf,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip real sleeping on `delay` statements.
    #[arg(long)]
    fast_forward: bool,

    /// Load a JSON `RunConfig` from this path; CLI flags above still win.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn verbosity_level(count: u8, base: LevelFilter) -> LevelFilter {
    match count {
        0 => base,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match RunConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("failed to load config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => RunConfig::default(),
    };
    if args.fast_forward {
        config.fast_forward = true;
    }

    let level = verbosity_level(args.verbose, config.log_level);
    if simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .is_err()
    {
        eprintln!("logger already initialized");
    }

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let file = match File::open(&args.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("failed to open {}: {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let sink = ConsoleActionSink::new(config.fast_forward);
    let mut interpreter = match Interpreter::new(file, sink) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("{}", e.render(&source));
            return ExitCode::FAILURE;
        }
    };

    match interpreter.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.render(&source));
            ExitCode::FAILURE
        }
    }
}
