//! # nim-backtrace - Demo Entry Point
//!
//! Nests `--depth` calls, then prints this thread's backtrace with the
//! requested bounds. Set `NIM_LIBBACKTRACE_DEBUG=1` to see every frame and
//! `RUST_LOG=debug` for pipeline diagnostics.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::io::Write;

use nim_backtrace::cli::Args;
use nim_backtrace::symbolization::{DwarfBackend, SymbolHandle};
use nim_backtrace::{Tracer, TracerConfig};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();
    debug!("{args:?}");

    let mut tracer =
        Tracer::new(SymbolHandle::new(DwarfBackend::for_current_exe), TracerConfig::from_env());
    tracer.ensure_initialized().context("Failed to load debug info")?;

    let backtrace = nested(&mut tracer, args.depth, args.max, args.skip);
    info!("{} backtrace lines", backtrace.lines().count());

    std::io::stdout().lock().write_all(backtrace.as_bytes())?;
    Ok(())
}

#[inline(never)]
fn nested(tracer: &mut Tracer<DwarfBackend>, depth: usize, max: usize, skip: usize) -> String {
    if depth == 0 {
        return tracer.format_backtrace(max, skip);
    }
    let backtrace = nested(tracer, depth - 1, max, skip);
    // Not a tail call, so every level keeps its frame
    std::hint::black_box(backtrace)
}
