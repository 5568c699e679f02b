use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use jr100::{
    debug::{
        self, DumpRange, RunLimits, DEFAULT_MAX_CYCLES, DEFAULT_WARMUP_CYCLES, EXIT_LOAD_FAILED,
    },
    MachineBuilder, ReportState,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    Hex,
    Bin,
}

#[derive(Parser, Debug)]
#[command(name = "jr100-debug")]
#[command(about = "Run a JR-100 machine-language program headless and dump memory", long_about = None)]
struct Args {
    /// BASIC ROM image (raw or PROG)
    #[arg(long)]
    rom: Option<PathBuf>,

    /// Program to load (.prg, .prog or .bas)
    #[arg(long)]
    program: PathBuf,

    /// Entry address, hex
    #[arg(long, value_parser = debug::parse_hex)]
    start: u16,

    /// Cycle limit; zero or less runs without one
    #[arg(long, default_value_t = DEFAULT_MAX_CYCLES, allow_negative_numbers = true)]
    cycles: i64,

    /// Stop when PC reaches this address (repeatable)
    #[arg(long = "break-pc", value_parser = debug::parse_hex, action = ArgAction::Append)]
    break_pc: Vec<u16>,

    /// Write the dump here instead of stdout
    #[arg(long)]
    dump: Option<PathBuf>,

    /// START:END range to dump (repeatable); defaults to all of memory
    #[arg(long = "dump-range", value_parser = debug::parse_range, action = ArgAction::Append)]
    dump_range: Vec<DumpRange>,

    #[arg(long = "dump-format", value_enum, default_value_t = DumpFormat::Hex)]
    dump_format: DumpFormat,

    /// Wall-clock limit in seconds
    #[arg(long)]
    seconds: Option<f64>,

    #[arg(long = "stack-pointer", value_parser = debug::parse_hex, default_value = "0x0244")]
    stack_pointer: u16,

    /// Jump to the program without resetting into the ROM first
    #[arg(long = "no-reset", action = ArgAction::SetTrue)]
    no_reset: bool,
}

fn write_dump(machine: &jr100::Machine, args: &Args) -> Result<()> {
    let ranges = debug::merge_ranges(&args.dump_range);
    let memory = machine.memory();
    let bytes = match args.dump_format {
        DumpFormat::Hex => {
            let mut text = debug::format_hex_dump(&memory, &ranges);
            text.push('\n');
            text.into_bytes()
        }
        DumpFormat::Bin => debug::binary_dump(&memory, &ranges),
    };

    match &args.dump {
        Some(path) => fs::write(path, bytes)
            .with_context(|| format!("writing dump to {}", path.display()))?,
        None => io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = MachineBuilder::new();
    if let Some(rom) = &args.rom {
        builder.rom_file(rom)?;
    }
    let mut machine = builder.build()?;
    debug::warm_up(&mut machine, DEFAULT_WARMUP_CYCLES);

    if let Err(e) = machine.load_program(&args.program) {
        eprintln!("Failed to load program: {e}");
        return Ok(ExitCode::from(EXIT_LOAD_FAILED as u8));
    }

    debug::prepare_cpu(&mut machine, args.start, args.stack_pointer, !args.no_reset);

    let limits = RunLimits {
        max_cycles: (args.cycles > 0).then_some(args.cycles as u64),
        breakpoints: args.break_pc.iter().copied().collect(),
        deadline: args
            .seconds
            .map(|seconds| Instant::now() + Duration::from_secs_f64(seconds.max(0.0))),
    };
    let outcome = debug::run(&mut machine, &limits);
    tracing::info!("{}", machine.report_state()?);

    match outcome.reason {
        debug::StopReason::TimeLimit => eprintln!("Execution stopped: time limit reached"),
        debug::StopReason::CycleLimit if limits.max_cycles.is_some() => {
            eprintln!("Execution stopped: cycle limit reached")
        }
        _ => {}
    }

    write_dump(&machine, &args)?;
    Ok(ExitCode::from(
        outcome.exit_code(limits.max_cycles.is_some()) as u8
    ))
}
