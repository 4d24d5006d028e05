//! # Stack Walking and Symbol Resolution
//!
//! This module owns everything that touches the process image: walking the
//! current call stack to collect program counters, and converting each program
//! counter into file/line/function records. This process is called
//! **symbolization**.
//!
//! ## The Symbolization Problem
//!
//! A stack walk records raw return addresses like `0x55f3a2b4c780`. To print
//! a backtrace we need:
//! - **Function name**: `NimMainModule`, `helperFn__libA_42`, `_ZN4core3fmt5write17h...E`
//! - **File path**: `/home/user/project/libA.nim`
//! - **Line number**: `42`
//!
//! One address can yield several records when the compiler inlined calls at
//! that site. Records come back innermost inlined frame first.
//!
//! ## Backend Abstraction
//!
//! [`SymbolBackend`] is the seam between the pipeline and the platform:
//!
//! ```text
//! walk(entry, skip, max) -> [pc0, pc1, ...]    innermost frame first
//! pcinfo(pc)             -> [record, ...]      innermost inlined frame first
//! ```
//!
//! The default implementation, [`DwarfBackend`], walks the stack with the
//! `backtrace` crate and reads the executable's own DWARF debug info:
//! - `object`: ELF binary parser
//! - `gimli`: Low-level DWARF parser
//! - `addr2line`: High-level symbolization library built on gimli
//!
//! ## PIE and ASLR
//!
//! Position-independent executables are loaded at a randomized base, so a
//! runtime address must be translated before the DWARF lookup:
//!
//! ```text
//! lookup = runtime_addr - runtime_start + linked_base
//! ```
//!
//! `runtime_start` comes from `/proc/self/maps` ([`memory_maps`]);
//! `linked_base` is the lowest file-backed segment address of the binary
//! (0 for a PIE, the fixed load address otherwise).
//!
//! ## Lifetime
//!
//! The backend's state must be built at most once per thread and is never
//! shared across threads. [`SymbolHandle`] enforces the first rule; the
//! `Rc`-based DWARF sections make [`DwarfBackend`] `!Send`, which enforces
//! the second.

pub mod handle;
pub mod memory_maps;
#[cfg(feature = "dwarf")]
pub mod symbolizer;

pub use handle::SymbolHandle;
pub use memory_maps::{parse_memory_maps, MemoryRange};
#[cfg(feature = "dwarf")]
pub use symbolizer::{current_exe_path, DwarfBackend};

use crate::domain::{BacktraceError, ProgramCounter, RawRecord};

/// Stack walker and symbol/line reader for one process image
pub trait SymbolBackend {
    /// Walk the current stack
    ///
    /// Returns at most `max_count` program counters, innermost first. Without
    /// `entry`, the backend's own frames are dropped and then `skip` more.
    /// With `entry` (a function address), every frame up to and including
    /// that function's frame is dropped and then `skip` more; if the function
    /// is not on the stack the walk behaves as without it.
    fn walk(&self, entry: Option<usize>, skip: usize, max_count: usize) -> Vec<ProgramCounter>;

    /// All records for one program counter, innermost inlined frame first
    ///
    /// # Errors
    /// Returns `BacktraceError::Backend` when the debug info cannot be read at
    /// this address
    fn pcinfo(&self, pc: ProgramCounter) -> Result<Vec<RawRecord>, BacktraceError>;
}
