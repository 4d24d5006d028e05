//! # nim-backtrace - Filtered Backtraces for a Compiled Host Runtime
//!
//! Produces human-readable backtraces of the calling thread, in the host
//! language's own stack trace format, by reading the program's DWARF debug
//! info. Runtime-internal frames are hidden, startup frames are cut off, and
//! the compiler-generated module entry point is renamed after its source file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Host Program (compiled to C)                    │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ get_backtrace_c() / format_backtrace()
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  nim-backtrace (This Crate)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Capture    │──▶│   Resolve    │──▶│    Format    │         │
//! │  │ (stack walk) │   │ (debug info) │   │  (reversed)  │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │         │                   │                                   │
//! │         ▼                   ▼                                   │
//! │  ┌──────────────┐   ┌──────────────┐                            │
//! │  │ SymbolHandle │   │ NameResolver │                            │
//! │  │   (DWARF)    │   │  (demangle,  │                            │
//! │  └──────────────┘   │   policy)    │                            │
//! │                     └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`pipeline`]: The three stages
//!   - `capture`: Walk the stack into program counters
//!   - `resolve`: Program counters to filtered records, with the two stop conditions
//!   - `format`: Render `"{filename}({line}) {function}\n"` lines, outermost call first
//!
//! - [`symbolization`]: Backend seam and its DWARF implementation
//!   - Lazy per-thread construction via [`symbolization::SymbolHandle`]
//!   - PIE address translation from `/proc/self/maps`
//!
//! - [`naming`]: Demangling and the frame policy (hide, stop, rename)
//!
//! - [`tracer`]: Per-thread context and the free functions below
//!
//! - [`ffi`]: C ABI for host runtimes linking the static library
//!
//! - [`config`]: Debug switch and policy selection
//!
//! - [`domain`]: Program counters, records, errors
//!
//! ## Typical Usage
//!
//! ```no_run
//! let backtrace = nim_backtrace::format_backtrace_default();
//! eprint!("{backtrace}");
//! ```
//!
//! ## Debug Mode
//!
//! `NIM_LIBBACKTRACE_DEBUG=1` (read once per thread) keeps every frame,
//! disables the bootstrap cut-off and ignores skip counts.

pub mod cli;
pub mod config;
pub mod domain;
pub mod ffi;
pub mod naming;
pub mod pipeline;
pub mod symbolization;
pub mod tracer;

pub use config::TracerConfig;
pub use domain::{
    BacktraceError, DebugRecord, EntryPoint, FilterDecision, ProgramCounter, RawRecord,
};
pub use tracer::{
    capture_program_counters, format_backtrace, format_backtrace_default, resolve_debug_info,
    Tracer,
};
