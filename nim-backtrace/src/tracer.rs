//! Per-thread backtrace context
//!
//! A [`Tracer`] bundles everything one thread needs to produce backtraces:
//! the lazily-built symbolization backend, the configuration read at
//! construction, and scratch buffers reused between calls. It is never shared
//! between threads.
//!
//! The module-level functions ([`format_backtrace`] and friends) use a
//! thread-local tracer over the executable's own debug info, built on first
//! use with [`TracerConfig::from_env`].
//!
//! Every public capturing function passes its own address down as an
//! [`EntryPoint`], so `skip` is counted the same way however many internal
//! frames sit between it and the stack walk.

use log::debug;
use nim_backtrace_common::{DEFAULT_SKIP, MAX_BACKTRACE_LINES};

use crate::config::TracerConfig;
use crate::domain::{BacktraceError, DebugRecord, EntryPoint, ProgramCounter};
use crate::naming::NameResolver;
use crate::pipeline::{capture, resolve_all, Renderer};
use crate::symbolization::{SymbolBackend, SymbolHandle};

/// Returned by [`format_backtrace`] when symbolization is compiled out
pub const UNSUPPORTED_MESSAGE: &str = "ERROR: symbolization is not supported in this build.\n";

/// Frames of `skip` covered by each entry's call chain
const CAPTURE_FRAMES: usize = 1;
const FORMAT_FRAMES: usize = 2;
const FORMAT_DEFAULT_FRAMES: usize = 3;

/// Explicit per-thread backtrace context
pub struct Tracer<B> {
    handle: SymbolHandle<B>,
    config: TracerConfig,
    renderer: Renderer,
}

impl<B: SymbolBackend> Tracer<B> {
    /// Create a tracer around a (possibly not yet initialized) backend handle
    pub fn new(handle: SymbolHandle<B>, config: TracerConfig) -> Self {
        let renderer = Renderer::new(config.initial_line_size);
        Self { handle, config, renderer }
    }

    /// Build the backend if it was not built yet
    ///
    /// # Errors
    /// See [`SymbolHandle::ensure_initialized`]
    pub fn ensure_initialized(&mut self) -> Result<(), BacktraceError> {
        self.handle.ensure_initialized()
    }

    /// Capture at most `max_count` program counters of the current stack
    ///
    /// `skip = 1` starts at the caller of this method.
    #[inline(never)]
    pub fn capture_program_counters(&mut self, max_count: usize, skip: usize) -> Vec<ProgramCounter> {
        let entry = EntryPoint::new(Self::capture_program_counters as usize, CAPTURE_FRAMES);
        let counters = self.capture_from(entry, max_count, skip);
        std::hint::black_box(counters)
    }

    pub(crate) fn capture_from(
        &mut self,
        entry: EntryPoint,
        max_count: usize,
        skip: usize,
    ) -> Vec<ProgramCounter> {
        capture(&mut self.handle, self.config.debug, max_count, skip, Some(entry))
    }

    /// Resolve program counters to at most `max_records` filtered records
    pub fn resolve_debug_info(
        &mut self,
        counters: &[ProgramCounter],
        max_records: usize,
    ) -> Vec<DebugRecord> {
        if self.handle.ensure_initialized().is_err() {
            return Vec::new();
        }
        let Some(backend) = self.handle.backend() else {
            return Vec::new();
        };
        let mut names = NameResolver::new(&self.config.policy, self.config.debug);
        resolve_all(backend, counters, max_records, &mut names)
    }

    /// Render the current stack, outermost call first
    ///
    /// At most `max_length` lines are produced, and `skip = 2` starts at the
    /// caller of this method. Returns an explanatory line if the backend
    /// failed to build during this call, and an empty string when there is
    /// nothing to show.
    #[inline(never)]
    pub fn format_backtrace(&mut self, max_length: usize, skip: usize) -> String {
        let entry = EntryPoint::new(Self::format_backtrace as usize, FORMAT_FRAMES);
        let backtrace = self.format_from(entry, max_length, skip);
        std::hint::black_box(backtrace)
    }

    /// [`Tracer::format_backtrace`] with the host runtime's defaults, starting
    /// at the caller of this method
    #[inline(never)]
    pub fn format_backtrace_default(&mut self) -> String {
        let entry = EntryPoint::new(Self::format_backtrace_default as usize, FORMAT_DEFAULT_FRAMES);
        let backtrace = self.format_from(entry, MAX_BACKTRACE_LINES, DEFAULT_SKIP);
        std::hint::black_box(backtrace)
    }

    pub(crate) fn format_from(&mut self, entry: EntryPoint, max_length: usize, skip: usize) -> String {
        if let Err(e) = self.handle.ensure_initialized() {
            return format!("{e}\n");
        }

        let counters = capture(&mut self.handle, self.config.debug, max_length, skip, Some(entry));
        let Some(backend) = self.handle.backend() else {
            return String::new();
        };

        let mut names = NameResolver::new(&self.config.policy, self.config.debug);
        let records = resolve_all(backend, &counters, max_length, &mut names);
        debug!("Resolved {} of {} frames", records.len(), counters.len());

        self.renderer.render(&records)
    }
}

#[cfg(feature = "dwarf")]
mod thread_tracer {
    use std::cell::RefCell;

    use super::{Tracer, TracerConfig};
    use crate::symbolization::{DwarfBackend, SymbolHandle};

    thread_local! {
        pub(super) static TRACER: RefCell<Tracer<DwarfBackend>> = RefCell::new(Tracer::new(
            SymbolHandle::new(DwarfBackend::for_current_exe),
            TracerConfig::from_env(),
        ));
    }
}

/// Run `f` with this thread's tracer
///
/// Returns `None` without symbolization support, during thread teardown, and
/// on re-entrant use (a backtrace requested while one is being built).
#[cfg(feature = "dwarf")]
fn with_thread_tracer<T>(
    f: impl FnOnce(&mut Tracer<crate::symbolization::DwarfBackend>) -> T,
) -> Option<T> {
    thread_tracer::TRACER
        .try_with(|tracer| tracer.try_borrow_mut().ok().map(|mut t| f(&mut t)))
        .ok()
        .flatten()
}

#[cfg(not(feature = "dwarf"))]
fn with_thread_tracer<T>(_f: impl FnOnce(&mut Tracer<NoBackend>) -> T) -> Option<T> {
    None
}

/// Backend type of builds without symbolization
#[cfg(not(feature = "dwarf"))]
pub enum NoBackend {}

#[cfg(not(feature = "dwarf"))]
impl SymbolBackend for NoBackend {
    fn walk(&self, _entry: Option<usize>, _skip: usize, _max_count: usize) -> Vec<ProgramCounter> {
        match *self {}
    }

    fn pcinfo(&self, _pc: ProgramCounter) -> Result<Vec<crate::domain::RawRecord>, BacktraceError> {
        match *self {}
    }
}

/// Capture through this thread's tracer on behalf of `entry`
pub(crate) fn capture_with_entry(entry: EntryPoint, max_count: usize, skip: usize) -> Vec<ProgramCounter> {
    with_thread_tracer(|t| t.capture_from(entry, max_count, skip)).unwrap_or_default()
}

/// Format through this thread's tracer on behalf of `entry`
pub(crate) fn format_with_entry(entry: EntryPoint, max_length: usize, skip: usize) -> String {
    if cfg!(not(feature = "dwarf")) {
        return UNSUPPORTED_MESSAGE.to_owned();
    }
    with_thread_tracer(|t| t.format_from(entry, max_length, skip)).unwrap_or_default()
}

/// Capture at most `max_count` program counters on this thread
///
/// `skip = 1` starts at the caller of this function.
#[inline(never)]
pub fn capture_program_counters(max_count: usize, skip: usize) -> Vec<ProgramCounter> {
    let entry = EntryPoint::new(capture_program_counters as usize, CAPTURE_FRAMES);
    let counters = capture_with_entry(entry, max_count, skip);
    std::hint::black_box(counters)
}

/// Resolve program counters to at most `max_records` filtered records on this thread
pub fn resolve_debug_info(counters: &[ProgramCounter], max_records: usize) -> Vec<DebugRecord> {
    with_thread_tracer(|t| t.resolve_debug_info(counters, max_records)).unwrap_or_default()
}

/// Render the current thread's stack, outermost call first
///
/// `skip = 2` starts at the caller of this function.
#[inline(never)]
pub fn format_backtrace(max_length: usize, skip: usize) -> String {
    let entry = EntryPoint::new(format_backtrace as usize, FORMAT_FRAMES);
    let backtrace = format_with_entry(entry, max_length, skip);
    std::hint::black_box(backtrace)
}

/// `format_backtrace(128, 3)`, starting at the caller of this function
#[inline(never)]
pub fn format_backtrace_default() -> String {
    let entry = EntryPoint::new(format_backtrace_default as usize, FORMAT_DEFAULT_FRAMES);
    let backtrace = format_with_entry(entry, MAX_BACKTRACE_LINES, DEFAULT_SKIP);
    std::hint::black_box(backtrace)
}
