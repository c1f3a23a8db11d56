//! `octavm-run` — executes an octavm program binary against a real
//! [`Terminal`](octavm_terminal::Terminal).
//!
//! Not part of spec's distilled CLI surface, but the natural counterpart
//! to `octavm-dis`: "an external driver builds a terminal, constructs a
//! CPU ... and invokes `run(program)`" is exactly what this binary does.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use octavm_cpu::{Cpu, MEMORY_SIZE};
use octavm_terminal::Terminal;

/// Run an octavm program binary to completion.
#[derive(Debug, Parser)]
#[command(name = "octavm-run", version, about)]
struct Args {
    /// Path to the program binary to execute.
    program: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let program = fs::read(&args.program)
        .map_err(|err| format!("program file {} not found: {err}", args.program.display()))?;

    let terminal = Terminal::new();
    let mut ram = [0u8; MEMORY_SIZE];
    let mut cpu = Cpu::new(&mut ram, terminal.port_table());

    cpu.run(&program).map_err(|err| err.to_string())?;
    log::info!("halted: PC=0x{:02X}, SP=0x{:02X}", cpu.pc, cpu.sp);
    Ok(())
}
