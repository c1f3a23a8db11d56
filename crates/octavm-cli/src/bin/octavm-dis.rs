//! `octavm-dis` — the decoder's command-line driver.
//!
//! Reads a raw program image from `source`, decodes it to an assembly
//! listing with `octavm_decoder::decode`, and writes the listing to
//! `output`. Exit codes and help text are supplied by `clap`; neither is
//! part of the decoder's core contract.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Disassemble an octavm program binary into an assembly listing.
#[derive(Debug, Parser)]
#[command(name = "octavm-dis", version, about)]
struct Args {
    /// Path to the raw program binary to decode.
    source: PathBuf,
    /// Path to write the decoded assembly listing to.
    output: PathBuf,
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
    let bytes = fs::read(&args.source)
        .map_err(|err| format!("source file {} not found: {err}", args.source.display()))?;

    let listing = octavm_decoder::decode(&bytes).map_err(|err| err.to_string())?;

    fs::write(&args.output, listing)
        .map_err(|err| format!("couldn't create {} file: {err}", args.output.display()))?;

    log::info!(
        "decoded {} bytes from {} to {}",
        bytes.len(),
        args.source.display(),
        args.output.display()
    );
    Ok(())
}
