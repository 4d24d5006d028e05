//! # Shared Definitions (Rust ↔ Host Runtime)
//!
//! Defines constants and data structures shared between the Rust backtrace
//! pipeline and the host runtime that links it through the C ABI. All types
//! crossing that boundary use `#[repr(C)]` for a stable memory layout.
//!
//! ## Key Items
//!
//! - [`DebuggingInfo`] - One resolved frame as handed to C callers
//! - [`MAX_BACKTRACE_LINES`] / [`DEFAULT_SKIP`] - Defaults of the zero-argument entry point
//! - [`DEBUG_ENV_VAR`] - Environment switch that disables frame hiding

#![no_std]

use core::ffi::{c_char, c_int};

// ============================================================================
// Limits and Defaults
// ============================================================================

/// Maximum number of frames rendered by the zero-argument entry point
///
/// Matches the host compiler's own stack trace limit.
pub const MAX_BACKTRACE_LINES: usize = 128;

/// Frames skipped by the zero-argument entry point
///
/// Hides the capture machinery itself. Collapses to 0 in debug mode.
pub const DEFAULT_SKIP: usize = 3;

/// Initial capacity guess for one rendered backtrace line, in bytes
pub const INITIAL_LINE_SIZE: usize = 100;

/// Length of the source extension stripped from module entry frames (`".nim"`)
pub const MODULE_EXTENSION_LEN: usize = 4;

// ============================================================================
// Environment
// ============================================================================

/// Environment variable that enables debug mode when set to exactly `"1"`
///
/// Debug mode keeps every frame (no hiding, no truncation at bootstrap frames)
/// and ignores the requested skip count.
pub const DEBUG_ENV_VAR: &str = "NIM_LIBBACKTRACE_DEBUG";

/// Value of [`DEBUG_ENV_VAR`] that enables debug mode
pub const DEBUG_ENV_ENABLED: &str = "1";

// ============================================================================
// C ABI Data Structures
// ============================================================================

/// One resolved frame in the legacy C array encoding
///
/// Arrays of this struct are terminated by an entry whose `filename` is null.
/// Both strings are owned by the array and released together with it.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DebuggingInfo {
    /// NUL-terminated source file path
    pub filename: *mut c_char,
    /// Source line number
    pub lineno: c_int,
    /// NUL-terminated, demangled and filtered function name
    pub function: *mut c_char,
}

impl DebuggingInfo {
    /// The terminator entry (all null)
    pub const TERMINATOR: Self = Self {
        filename: core::ptr::null_mut(),
        lineno: 0,
        function: core::ptr::null_mut(),
    };

    /// Returns true if this entry marks the end of the array.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.filename.is_null()
    }
}

/// Program counter value reserved as the end marker of legacy counter arrays
pub const PROGRAM_COUNTER_SENTINEL: usize = 0;
