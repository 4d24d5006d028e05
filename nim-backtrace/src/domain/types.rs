//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep raw machine addresses apart from line numbers
//! and other integers, and make the pipeline stages' signatures expressive.

use std::fmt;

/// Program counter
///
/// The return address of one call-stack frame, as produced by the stack
/// walker. Sequences of counters are ordered innermost frame first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramCounter(pub usize);

impl ProgramCounter {
    /// Address to use for debug info lookups
    ///
    /// A return address points just past the call instruction, so the call
    /// site itself is one byte earlier.
    #[must_use]
    pub fn lookup_address(self) -> usize {
        self.0.saturating_sub(1)
    }
}

impl fmt::Display for ProgramCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<usize> for ProgramCounter {
    fn from(pc: usize) -> Self {
        ProgramCounter(pc)
    }
}

/// Public function a capture was requested through
///
/// `address` is the function's entry address, matched against frame symbol
/// addresses during the stack walk. `library_frames` is the part of `skip`
/// the function's own call chain stands for: [`format_backtrace_default`]
/// counts as three frames (capture, format, default), so its default skip of
/// 3 starts the backtrace exactly at its caller.
///
/// [`format_backtrace_default`]: crate::tracer::format_backtrace_default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub address: usize,
    pub library_frames: usize,
}

impl EntryPoint {
    #[must_use]
    pub fn new(address: usize, library_frames: usize) -> Self {
        Self { address, library_frames }
    }

    /// Frames of the caller's stack dropped for `skip`
    ///
    /// `None` when `skip` does not cover the entry's own chain; the walk then
    /// counts from the capturer instead.
    #[must_use]
    pub fn caller_skip(self, skip: usize) -> Option<usize> {
        skip.checked_sub(self.library_frames)
    }
}

/// Symbol record exactly as returned by a symbolization backend
///
/// The function name is still mangled. Either field may be missing when the
/// debug info has a gap at this address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub filename: Option<String>,
    pub line: u32,
    pub function: Option<String>,
}

impl RawRecord {
    /// Create a fully populated record
    pub fn new(filename: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self { filename: Some(filename.into()), line, function: Some(function.into()) }
    }
}

/// Resolved (filename, line, function) triple for one rendered frame
///
/// Records kept for output always carry non-empty filename and function text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRecord {
    pub filename: String,
    pub line: u32,
    pub function: String,
}

impl fmt::Display for DebugRecord {
    /// Renders in the host runtime's stack trace format, without the newline
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) {}", self.filename, self.line, self.function)
    }
}

/// What the name resolver decided for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Render the record with its demangled name
    Keep,
    /// Render the record under a different function name
    Rename(String),
    /// Omit this record, keep resolving
    SkipFrame,
    /// Omit this record and everything after it
    StopBacktrace,
}

impl FilterDecision {
    /// Returns true if the record this decision belongs to is rendered.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, FilterDecision::Keep | FilterDecision::Rename(_))
    }
}
